//! Domain types for the rail pass planner.
//!
//! This module contains the core value types for journeys found on the
//! booking site. Types enforce their invariants at construction time, so
//! code that receives them can trust their validity.

mod error;
mod fare;
mod leg;
mod station;
mod time;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;

pub use error::DomainError;
pub use fare::{FareClass, Fares, InvalidPrice, Price};
pub use leg::{
    ATTRIBUTE_NAMES, CSV_COLUMNS, JourneyLeg, LegParts, NO_TRAIN_NUMBER, SubSegment, TravelMode,
};
pub use station::{InvalidStationCode, StationCode};
pub use time::{
    SEARCH_DATE_FORMAT, TimeError, format_search_date, infer_arrival_date, ordinal_suffix,
    parse_clock, parse_iso_datetime, parse_search_date, pretty_pair,
};

/// Results of one search, keyed by position in extraction order (from 0).
pub type ResultSet = BTreeMap<usize, JourneyLeg>;
