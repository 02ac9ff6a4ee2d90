//! Sanity checks run before a new search.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::StationCode;

use super::Itinerary;

/// Something odd about a search compared to the most recent saved segment.
///
/// Warnings never block a search; the caller decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchWarning {
    SameRoute,
    SameOrigin { origin: StationCode },
    SameDestination { destination: StationCode },
    /// Leaves on the day the previous segment arrives
    TightTransfer { arrival: NaiveDateTime },
    /// Leaves before the previous segment arrives
    DepartsBeforeArrival { arrival_date: NaiveDate },
}

impl fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchWarning::SameRoute => write!(
                f,
                "The selected origin and destination stations are the same as the previous segment's stations."
            ),
            SearchWarning::SameOrigin { .. } => write!(
                f,
                "The selected origin station is the same as the previous segment's origin."
            ),
            SearchWarning::SameDestination { .. } => write!(
                f,
                "The selected destination station is the same as the previous segment's destination."
            ),
            SearchWarning::TightTransfer { arrival } => write!(
                f,
                "The selected departure date is the same as the most recent segment's arrival date, scheduled at {}. Ensure that there is ample time for a transfer.",
                arrival.format("%I:%M %p")
            ),
            SearchWarning::DepartsBeforeArrival { arrival_date } => write!(
                f,
                "The selected departure date is before the most recent segment's arrival date of {}.",
                arrival_date.format("%A, %B %d, %Y")
            ),
        }
    }
}

/// Compare a planned search with the most recent saved segment.
///
/// At most one station warning and one date warning are produced.
pub fn check_new_search(
    itinerary: &Itinerary,
    origin: StationCode,
    destination: StationCode,
    date: NaiveDate,
) -> Vec<SearchWarning> {
    let Some(previous) = itinerary.most_recent_segment() else {
        return Vec::new();
    };

    let mut warnings = Vec::new();
    let same_origin = previous.origin() == origin;
    let same_destination = previous.destination() == destination;
    match (same_origin, same_destination) {
        (true, true) => warnings.push(SearchWarning::SameRoute),
        (true, false) => warnings.push(SearchWarning::SameOrigin { origin }),
        (false, true) => warnings.push(SearchWarning::SameDestination { destination }),
        (false, false) => {}
    }

    let arrival = previous.arrival();
    if arrival.date() == date {
        warnings.push(SearchWarning::TightTransfer { arrival });
    } else if arrival.date() > date {
        warnings.push(SearchWarning::DepartsBeforeArrival {
            arrival_date: arrival.date(),
        });
    }

    warnings
}
