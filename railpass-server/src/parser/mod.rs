//! Turning raw result records into journey legs.
//!
//! The parser is pure: no I/O, no clock. Callers pass the search context
//! (stations, requested date and today's date) alongside each record.

mod convert;
mod records;

use chrono::NaiveDate;

use crate::domain::{DomainError, InvalidStationCode, StationCode, TimeError};

pub use convert::{parse_journey_option, parse_scraped_row, parse_stored_search, segment_count_from_label};
pub use records::{
    ScrapedRow, StoredAmount, StoredFare, StoredJourneyOption, StoredSearch, StoredTravelLeg,
};

/// What the parser needs to know about the search that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchContext {
    pub origin: StationCode,
    pub destination: StationCode,
    /// Requested departure date.
    pub date: NaiveDate,
    /// Fallback year source for arrival days without a year.
    pub today: NaiveDate,
}

/// Why a record did not become a leg.
///
/// `Delayed` and `SoldOut` are ordinary outcomes; callers drop those records
/// without treating them as failures.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("service is delayed or cancelled")]
    Delayed,

    #[error("sold out in every class")]
    SoldOut,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidTime(#[from] TimeError),

    #[error(transparent)]
    InvalidStation(#[from] InvalidStationCode),

    #[error(transparent)]
    InvalidLeg(#[from] DomainError),

    #[error("malformed search record: {0}")]
    Json(#[from] serde_json::Error),
}
