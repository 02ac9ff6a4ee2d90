//! The rail pass itinerary.
//!
//! An [`Itinerary`] keeps every search performed and the legs saved from
//! them. Saved legs occupy numbered slots: a leg made of `n` services takes
//! `n` slots, and the next leg starts right after it. Every mutation keeps
//! the slot numbering packed and the search records in step with it.

mod checks;
mod error;
mod export;
mod persist;
mod record;
mod rekey;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{JourneyLeg, ResultSet, StationCode};

pub use checks::{SearchWarning, check_new_search};
pub use error::ItineraryError;
pub use export::{CsvSink, ExportSink, export_search, export_segments};
pub use persist::{ITINERARY_FILE_VERSION, ItineraryFile, PersistError, load, save};
pub use record::SearchRecord;

/// Which neighbour a segment trades places with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// All searches and saved segments of the current plan.
///
/// # Invariants
///
/// - `segments` and `segment_results` have the same keys
/// - keys start at 1 and each key is the previous key plus that segment's
///   width
/// - `num_segments` is the next free key, `1 + Σ width`
/// - every segment's search exists in `all_results`
///
/// Operations that fail leave the itinerary unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    segments: BTreeMap<u32, JourneyLeg>,
    segment_results: BTreeMap<u32, u32>,
    all_results: BTreeMap<u32, SearchRecord>,
    num_segments: u32,
}

impl Default for Itinerary {
    fn default() -> Self {
        Self {
            segments: BTreeMap::new(),
            segment_results: BTreeMap::new(),
            all_results: BTreeMap::new(),
            num_segments: 1,
        }
    }
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved segments by slot number.
    pub fn segments(&self) -> &BTreeMap<u32, JourneyLeg> {
        &self.segments
    }

    /// The search each saved segment came from.
    pub fn segment_results(&self) -> &BTreeMap<u32, u32> {
        &self.segment_results
    }

    pub fn searches(&self) -> &BTreeMap<u32, SearchRecord> {
        &self.all_results
    }

    pub fn search(&self, number: u32) -> Option<&SearchRecord> {
        self.all_results.get(&number)
    }

    pub fn segment(&self, key: u32) -> Option<&JourneyLeg> {
        self.segments.get(&key)
    }

    /// Slot number the next saved segment will take.
    pub fn num_segments(&self) -> u32 {
        self.num_segments
    }

    /// Record a search and return its number.
    ///
    /// Searches are numbered from 1 in the order they were made.
    pub fn add_search(
        &mut self,
        origin: StationCode,
        destination: StationCode,
        date: NaiveDate,
        results: ResultSet,
    ) -> u32 {
        let number = self
            .all_results
            .last_key_value()
            .map_or(1, |(&n, _)| n + 1);
        self.all_results.insert(
            number,
            SearchRecord::new(origin, destination, date, results),
        );
        debug!(search = number, "recorded search");
        number
    }

    /// Save `leg`, found among the results of `search`, as the last segment.
    ///
    /// Returns the segment's slot number.
    pub fn create_segment(&mut self, leg: &JourneyLeg, search: u32) -> Result<u32, ItineraryError> {
        let record = self
            .all_results
            .get_mut(&search)
            .ok_or(ItineraryError::UnknownSearch(search))?;
        let index = record
            .index_of(leg)
            .ok_or(ItineraryError::LegNotInSearch { search })?;
        let leg = record.results[&index].clone();
        let key = self.num_segments;
        let next = key
            .checked_add(leg.segment_count())
            .ok_or(ItineraryError::Full)?;
        record.mark_saved(index);

        self.num_segments = next;
        self.segments.insert(key, leg);
        self.segment_results.insert(key, search);
        debug!(segment = key, search, index, "saved segment");
        Ok(key)
    }

    /// Save result `index` of `search` as the last segment.
    pub fn save_result(&mut self, search: u32, index: usize) -> Result<u32, ItineraryError> {
        let leg = self
            .all_results
            .get(&search)
            .ok_or(ItineraryError::UnknownSearch(search))?
            .results
            .get(&index)
            .ok_or(ItineraryError::LegNotInSearch { search })?
            .clone();
        self.create_segment(&leg, search)
    }

    /// Remove a segment and close the gap it leaves.
    ///
    /// Returns the number of the search it came from.
    pub fn delete_segment(&mut self, key: u32) -> Result<u32, ItineraryError> {
        let search = *self
            .segment_results
            .get(&key)
            .ok_or(ItineraryError::UnknownSegment(key))?;
        let Some(leg) = self.segments.remove(&key) else {
            return Err(ItineraryError::UnknownSegment(key));
        };
        self.segment_results.remove(&key);

        if let Some(record) = self.all_results.get_mut(&search) {
            if let Some(index) = record.index_of(&leg) {
                record.unmark_saved(index);
            }
        }

        let width = leg.segment_count();
        rekey::shift_down_after(&mut self.segments, key, width);
        rekey::shift_down_after(&mut self.segment_results, key, width);
        self.num_segments -= width;
        debug!(segment = key, search, "deleted segment");
        Ok(search)
    }

    /// Trade places with the neighbouring segment.
    ///
    /// Returns the segment's new slot number.
    pub fn swap_segment(&mut self, key: u32, direction: Direction) -> Result<u32, ItineraryError> {
        if !self.segments.contains_key(&key) {
            return Err(ItineraryError::UnknownSegment(key));
        }
        let cannot = ItineraryError::CannotSwap { segment: key };

        let (first, second) = match direction {
            Direction::Up => {
                let (&previous, _) = self.segments.range(..key).next_back().ok_or(cannot)?;
                (previous, key)
            }
            Direction::Down => {
                let (&next, _) = self.segments.range(key + 1..).next().ok_or(cannot)?;
                (key, next)
            }
        };
        let second_width = self.segments[&second].segment_count();

        rekey::swap_adjacent(&mut self.segments, first, second, second_width);
        rekey::swap_adjacent(&mut self.segment_results, first, second, second_width);

        let new_key = match direction {
            Direction::Up => first,
            Direction::Down => first + second_width,
        };
        debug!(segment = key, new_key, ?direction, "swapped segment");
        Ok(new_key)
    }

    /// The saved segment with the highest slot number.
    pub fn most_recent_segment(&self) -> Option<&JourneyLeg> {
        self.segments.last_key_value().map(|(_, leg)| leg)
    }

    /// Verify the invariants listed on [`Itinerary`].
    pub fn check_invariants(&self) -> Result<(), ItineraryError> {
        let violated = |msg: String| Err(ItineraryError::InvariantViolated(msg));

        if !self.segments.keys().eq(self.segment_results.keys()) {
            return violated("segment and search maps disagree".into());
        }

        let next = rekey::is_packed(
            self.segments
                .iter()
                .map(|(&k, leg)| (k, leg.segment_count())),
        )
        .map_err(ItineraryError::InvariantViolated)?;
        if next != self.num_segments {
            return violated(format!(
                "next slot is {} but segments end at {next}",
                self.num_segments
            ));
        }

        for (key, search) in &self.segment_results {
            let Some(record) = self.all_results.get(search) else {
                return violated(format!("segment {key} refers to missing search {search}"));
            };
            if record.index_of(&self.segments[key]).is_none() {
                return violated(format!("segment {key} is not among search {search}'s results"));
            }
        }

        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::testing::{code, leg, results};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Save(usize),
        Delete(usize),
        Swap(usize, Direction),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Save),
            any::<usize>().prop_map(Op::Delete),
            (any::<usize>(), prop_oneof![Just(Direction::Up), Just(Direction::Down)])
                .prop_map(|(i, d)| Op::Swap(i, d)),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_under_any_sequence(ops in prop::collection::vec(op(), 0..30)) {
            let mut it = Itinerary::new();
            let search = it.add_search(
                code("WAS"),
                code("NYP"),
                NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
                results(vec![leg("171", 7, 1), leg("x", 9, 2), leg("93", 12, 1), leg("y", 14, 3)]),
            );

            for op in ops {
                let keys: Vec<u32> = it.segments().keys().copied().collect();
                match op {
                    Op::Save(i) => {
                        it.save_result(search, i).unwrap();
                    }
                    Op::Delete(i) if !keys.is_empty() => {
                        it.delete_segment(keys[i % keys.len()]).unwrap();
                    }
                    Op::Swap(i, direction) if !keys.is_empty() => {
                        let _ = it.swap_segment(keys[i % keys.len()], direction);
                    }
                    _ => {}
                }
                prop_assert!(it.check_invariants().is_ok());
                let saved = &it.search(search).unwrap().saved_indices;
                prop_assert_eq!(saved.len(), it.segments().len());
            }
        }
    }
}
