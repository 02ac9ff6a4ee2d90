//! Data transfer objects for web requests and responses.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{FareClass, JourneyLeg, ResultSet, SubSegment, format_search_date, pretty_pair};
use crate::itinerary::{Direction, Itinerary, SearchRecord, SearchWarning};

/// Request to run a search.
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    /// Station code or directory display key
    pub origin: String,

    /// Station code or directory display key
    pub destination: String,

    /// `mm/dd/yyyy` or `yyyy-mm-dd`
    pub date: String,
}

/// Request to save one search result as a segment.
#[derive(Debug, Deserialize)]
pub struct SaveSegmentBody {
    pub search: u32,
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SwapBody {
    pub direction: Direction,
}

/// Query selecting export columns, comma separated.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub columns: Option<String>,
}

impl ExportQuery {
    pub fn column_list(&self) -> Option<Vec<String>> {
        let columns: Vec<String> = self
            .columns
            .as_deref()?
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        (!columns.is_empty()).then_some(columns)
    }
}

#[derive(Debug, Deserialize)]
pub struct StationQuery {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StationMatch {
    pub key: String,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StationSearchResponse {
    pub stations: Vec<StationMatch>,
}

/// Fares formatted for display.
#[derive(Debug, Serialize)]
pub struct FaresView {
    pub coach: Option<String>,
    pub business: Option<String>,
    pub sleeper: Option<String>,
}

/// A journey leg as shown to clients.
#[derive(Debug, Serialize)]
pub struct LegView {
    /// Position in its search's results, where relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub origin: String,
    pub destination: String,
    pub train_id: String,
    pub name: String,
    pub train: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub departs: String,
    pub arrives: String,
    pub duration: String,
    pub fares: FaresView,
    pub segment_count: u32,
    pub segment_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_segments: Vec<SubSegment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stops: Vec<String>,
}

impl LegView {
    pub fn from_leg(leg: &JourneyLeg, index: Option<usize>) -> Self {
        let (departs, arrives) = pretty_pair(leg.departure(), leg.arrival());
        let price = |class| leg.fares().get(class).map(|p| p.to_string());
        Self {
            index,
            origin: leg.origin().to_string(),
            destination: leg.destination().to_string(),
            train_id: leg.train_id().to_string(),
            name: leg.name().to_string(),
            train: leg.train_label(),
            departure: leg.departure(),
            arrival: leg.arrival(),
            departs,
            arrives,
            duration: leg.elapsed().to_string(),
            fares: FaresView {
                coach: price(FareClass::Coach),
                business: price(FareClass::Business),
                sleeper: price(FareClass::Sleeper),
            },
            segment_count: leg.segment_count(),
            segment_type: leg.segment_label().to_string(),
            sub_segments: leg.sub_segments().to_vec(),
            stops: leg.stops().iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_results(results: &ResultSet) -> Vec<Self> {
        results
            .iter()
            .map(|(&i, leg)| Self::from_leg(leg, Some(i)))
            .collect()
    }
}

/// Response to a successful search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search: u32,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub results: Vec<LegView>,
    /// Notes comparing this search with the most recent saved segment
    pub warnings: Vec<WarningView>,
}

#[derive(Debug, Serialize)]
pub struct WarningView {
    #[serde(flatten)]
    pub warning: SearchWarning,
    pub message: String,
}

impl From<SearchWarning> for WarningView {
    fn from(warning: SearchWarning) -> Self {
        Self {
            message: warning.to_string(),
            warning,
        }
    }
}

/// A recorded search.
#[derive(Debug, Serialize)]
pub struct SearchRecordView {
    pub search: u32,
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub has_segment_saved: bool,
    pub saved_indices: Vec<usize>,
    pub results: Vec<LegView>,
}

impl SearchRecordView {
    pub fn from_record(search: u32, record: &SearchRecord) -> Self {
        Self {
            search,
            origin: record.origin.to_string(),
            destination: record.destination.to_string(),
            date: format_search_date(record.date),
            has_segment_saved: record.has_segment_saved,
            saved_indices: record.saved_indices.clone(),
            results: LegView::from_results(&record.results),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SegmentView {
    pub segment: u32,
    pub search: u32,
    pub leg: LegView,
}

/// The saved itinerary.
#[derive(Debug, Serialize)]
pub struct ItineraryView {
    pub segments: Vec<SegmentView>,
    pub num_segments: u32,
    pub searches: usize,
}

impl ItineraryView {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        let segments = itinerary
            .segments()
            .iter()
            .map(|(&segment, leg)| SegmentView {
                segment,
                search: itinerary
                    .segment_results()
                    .get(&segment)
                    .copied()
                    .unwrap_or_default(),
                leg: LegView::from_leg(leg, None),
            })
            .collect();
        Self {
            segments,
            num_segments: itinerary.num_segments(),
            searches: itinerary.searches().len(),
        }
    }
}

/// Slot number of a segment after a change.
#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub segment: u32,
}

/// The search a deleted segment came from.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub search: u32,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub path: String,
    pub segments: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Search failure category, for failed searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}
