//! One executed search and what was saved from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{JourneyLeg, ResultSet, StationCode};

/// The results of one search, plus which of them are saved in the itinerary.
///
/// Records are never deleted; only their saved indices change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub origin: StationCode,
    pub destination: StationCode,
    pub date: NaiveDate,
    pub results: ResultSet,
    pub has_segment_saved: bool,
    pub saved_indices: Vec<usize>,
}

impl SearchRecord {
    pub fn new(
        origin: StationCode,
        destination: StationCode,
        date: NaiveDate,
        results: ResultSet,
    ) -> Self {
        Self {
            origin,
            destination,
            date,
            results,
            has_segment_saved: false,
            saved_indices: Vec::new(),
        }
    }

    /// Index of the result equal to `leg`.
    pub fn index_of(&self, leg: &JourneyLeg) -> Option<usize> {
        self.results
            .iter()
            .find_map(|(&i, candidate)| (candidate == leg).then_some(i))
    }

    pub(super) fn mark_saved(&mut self, index: usize) {
        self.saved_indices.push(index);
        self.has_segment_saved = true;
    }

    /// Drop one saved reference to `index`.
    pub(super) fn unmark_saved(&mut self, index: usize) {
        if let Some(pos) = self.saved_indices.iter().position(|&i| i == index) {
            self.saved_indices.remove(pos);
        }
        self.has_segment_saved = !self.saved_indices.is_empty();
    }
}
