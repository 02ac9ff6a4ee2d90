//! Journey leg type.
//!
//! A `JourneyLeg` is one bookable option between an origin and destination:
//! a single train, or several trains and buses sold together. It is the unit
//! stored both in search results and in the saved itinerary.

use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DomainError, FareClass, Fares, StationCode, format_search_date, pretty_pair};

/// Placeholder identifier for legs made of several services.
pub const NO_TRAIN_NUMBER: &str = "N/A";

/// Attribute names understood by [`JourneyLeg::attribute`], in display order.
pub const ATTRIBUTE_NAMES: [&str; 17] = [
    "Origin",
    "Destination",
    "Number",
    "Name",
    "Train",
    "Departure Time",
    "Departure Date",
    "Departs",
    "Duration",
    "Arrival Time",
    "Arrival Date",
    "Arrives",
    "Coach Price",
    "Business Price",
    "Sleeper Price",
    "Segment Type",
    "Number of Segments",
];

/// Columns of the compact spreadsheet row.
pub const CSV_COLUMNS: [&str; 6] = [
    "Origin",
    "Destination",
    "Train",
    "Departs",
    "Arrives",
    "Duration",
];

/// How a physical sub-leg is operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Train,
    Bus,
    Other,
}

impl TravelMode {
    /// Classify a service-type label such as `"TRAIN"` or `"Thruway Bus"`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        if lower.contains("bus") || lower.contains("thruway") {
            TravelMode::Bus
        } else if lower.contains("train") || lower.contains("rail") {
            TravelMode::Train
        } else {
            TravelMode::Other
        }
    }

    /// Plural noun used in "Multiple ..." labels.
    pub fn plural(&self) -> &'static str {
        match self {
            TravelMode::Train => "Trains",
            TravelMode::Bus => "Buses",
            TravelMode::Other => "Services",
        }
    }
}

/// Detail for one physical train or bus within a multi-segment leg.
///
/// Only the structured client-storage record supplies these details; legs
/// scraped from the page carry placeholder entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSegment {
    pub number: String,
    pub name: String,
    pub mode: TravelMode,
    pub operator: Option<String>,
    pub origin: Option<StationCode>,
    pub destination: Option<StationCode>,
    pub departure: Option<NaiveDateTime>,
    pub arrival: Option<NaiveDateTime>,
    pub duration: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub available_inventory: Option<u32>,
}

impl SubSegment {
    /// A sub-segment whose details were not supplied.
    pub fn unknown() -> Self {
        Self {
            number: NO_TRAIN_NUMBER.to_string(),
            name: String::new(),
            mode: TravelMode::Other,
            operator: None,
            origin: None,
            destination: None,
            departure: None,
            arrival: None,
            duration: None,
            amenities: Vec::new(),
            available_inventory: None,
        }
    }
}

/// Unvalidated fields of a [`JourneyLeg`].
///
/// This is also the serialized form; deserializing a `JourneyLeg` goes
/// through [`JourneyLeg::new`] so stored legs are re-validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegParts {
    pub origin: StationCode,
    pub destination: StationCode,
    pub train_id: String,
    pub name: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    /// Free text such as `3h 25m`; not always a parseable duration.
    pub elapsed: String,
    pub fares: Fares,
    pub segment_count: u32,
    #[serde(default)]
    pub segment_label: String,
    #[serde(default)]
    pub sub_segments: Vec<SubSegment>,
    #[serde(default)]
    pub stops: Vec<StationCode>,
}

/// One candidate or saved journey.
///
/// # Invariants
///
/// - `segment_count >= 1`
/// - `segment_count == 1` implies no sub-segments; otherwise there is exactly
///   one sub-segment per counted segment
/// - at least one fare class has a price
/// - `arrival >= departure`
///
/// Two legs are equal when their train identifier and departure timestamp
/// match. This identity re-locates a saved leg inside a search's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LegParts", into = "LegParts")]
pub struct JourneyLeg {
    parts: LegParts,
}

impl JourneyLeg {
    /// Validate parts into a leg.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any invariant listed on [`JourneyLeg`] fails, or the
    /// train identifier is blank.
    pub fn new(parts: LegParts) -> Result<Self, DomainError> {
        if parts.train_id.trim().is_empty() {
            return Err(DomainError::InvalidLeg("train identifier is empty"));
        }
        if parts.segment_count == 0 {
            return Err(DomainError::ZeroSegments);
        }
        if parts.fares.is_sold_out() {
            return Err(DomainError::SoldOut);
        }
        if parts.arrival < parts.departure {
            return Err(DomainError::ArrivalBeforeDeparture);
        }

        let details = parts.sub_segments.len();
        let consistent = if parts.segment_count == 1 {
            details == 0
        } else {
            details == parts.segment_count as usize
        };
        if !consistent {
            return Err(DomainError::SubSegmentMismatch {
                count: parts.segment_count,
                details,
            });
        }

        Ok(Self { parts })
    }

    pub fn origin(&self) -> StationCode {
        self.parts.origin
    }

    pub fn destination(&self) -> StationCode {
        self.parts.destination
    }

    /// Train number, or [`NO_TRAIN_NUMBER`] for multi-service legs.
    pub fn train_id(&self) -> &str {
        &self.parts.train_id
    }

    pub fn name(&self) -> &str {
        &self.parts.name
    }

    pub fn departure(&self) -> NaiveDateTime {
        self.parts.departure
    }

    pub fn arrival(&self) -> NaiveDateTime {
        self.parts.arrival
    }

    pub fn elapsed(&self) -> &str {
        &self.parts.elapsed
    }

    pub fn fares(&self) -> &Fares {
        &self.parts.fares
    }

    /// Number of itinerary slots this leg occupies.
    pub fn segment_count(&self) -> u32 {
        self.parts.segment_count
    }

    /// Service description as shown by the site (`Direct`, `2 Segments`, ...).
    pub fn segment_label(&self) -> &str {
        &self.parts.segment_label
    }

    pub fn sub_segments(&self) -> &[SubSegment] {
        &self.parts.sub_segments
    }

    /// Intermediate station codes, when known.
    pub fn stops(&self) -> &[StationCode] {
        &self.parts.stops
    }

    /// Human-readable train label, e.g. `Northeast Regional 171`.
    pub fn train_label(&self) -> String {
        format!("{} {}", self.parts.name, self.parts.train_id)
    }

    /// Render one named attribute, or `None` if the name is not recognised.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let p = &self.parts;
        let price = |class: FareClass| p.fares.get(class).map(|x| x.to_string()).unwrap_or_default();

        let value = match name {
            "Origin" => p.origin.to_string(),
            "Destination" => p.destination.to_string(),
            "Number" => p.train_id.clone(),
            "Name" => p.name.clone(),
            "Train" => self.train_label(),
            "Departure Time" => p.departure.format("%I:%M%p").to_string(),
            "Departure Date" => format_search_date(p.departure.date()),
            "Departs" => pretty_pair(p.departure, p.arrival).0,
            "Duration" => p.elapsed.clone(),
            "Arrival Time" => p.arrival.format("%I:%M%p").to_string(),
            "Arrival Date" => format_search_date(p.arrival.date()),
            "Arrives" => pretty_pair(p.departure, p.arrival).1,
            "Coach Price" => price(FareClass::Coach),
            "Business Price" => price(FareClass::Business),
            "Sleeper Price" => price(FareClass::Sleeper),
            "Segment Type" => p.segment_label.clone(),
            "Number of Segments" => p.segment_count.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Render the given attributes in order; unknown names become empty cells.
    pub fn attributes<S: AsRef<str>>(&self, columns: &[S]) -> Vec<String> {
        columns
            .iter()
            .map(|col| {
                let col = col.as_ref();
                self.attribute(col).unwrap_or_else(|| {
                    debug!(attribute = col, "unrecognised leg attribute");
                    String::new()
                })
            })
            .collect()
    }

    /// The compact spreadsheet row, keyed by [`CSV_COLUMNS`].
    pub fn csv_row(&self) -> Vec<(String, String)> {
        let p = &self.parts;
        let values = [
            p.origin.to_string(),
            p.destination.to_string(),
            self.train_label(),
            p.departure.format("%a %d %I:%M%p").to_string(),
            p.arrival.format("%a %d %I:%M%p").to_string(),
            p.elapsed.clone(),
        ];
        CSV_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .zip(values)
            .collect()
    }
}

impl TryFrom<LegParts> for JourneyLeg {
    type Error = DomainError;

    fn try_from(parts: LegParts) -> Result<Self, Self::Error> {
        Self::new(parts)
    }
}

impl From<JourneyLeg> for LegParts {
    fn from(leg: JourneyLeg) -> Self {
        leg.parts
    }
}

impl PartialEq for JourneyLeg {
    fn eq(&self, other: &Self) -> bool {
        self.parts.train_id == other.parts.train_id && self.parts.departure == other.parts.departure
    }
}

impl Eq for JourneyLeg {}

impl Hash for JourneyLeg {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.train_id.hash(state);
        self.parts.departure.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Price;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn parts() -> LegParts {
        LegParts {
            origin: StationCode::parse("WAS").unwrap(),
            destination: StationCode::parse("NYP").unwrap(),
            train_id: "171".into(),
            name: "Northeast Regional".into(),
            departure: at(2024, 3, 29, 7, 5),
            arrival: at(2024, 3, 29, 10, 30),
            elapsed: "3h 25m".into(),
            fares: Fares {
                coach: Some(Price::from_cents(4_900)),
                business: None,
                sleeper: None,
            },
            segment_count: 1,
            segment_label: "Direct".into(),
            sub_segments: Vec::new(),
            stops: Vec::new(),
        }
    }

    #[test]
    fn valid_leg() {
        let leg = JourneyLeg::new(parts()).unwrap();
        assert_eq!(leg.train_id(), "171");
        assert_eq!(leg.segment_count(), 1);
        assert!(leg.sub_segments().is_empty());
    }

    #[test]
    fn rejects_sold_out() {
        let mut p = parts();
        p.fares = Fares::default();
        assert_eq!(JourneyLeg::new(p).unwrap_err(), DomainError::SoldOut);
    }

    #[test]
    fn rejects_arrival_before_departure() {
        let mut p = parts();
        p.arrival = at(2024, 3, 29, 6, 0);
        assert_eq!(
            JourneyLeg::new(p).unwrap_err(),
            DomainError::ArrivalBeforeDeparture
        );
    }

    #[test]
    fn rejects_zero_segments() {
        let mut p = parts();
        p.segment_count = 0;
        assert_eq!(JourneyLeg::new(p).unwrap_err(), DomainError::ZeroSegments);
    }

    #[test]
    fn rejects_blank_train_id() {
        let mut p = parts();
        p.train_id = "  ".into();
        assert!(matches!(
            JourneyLeg::new(p).unwrap_err(),
            DomainError::InvalidLeg(_)
        ));
    }

    #[test]
    fn sub_segments_must_match_count() {
        let mut single_with_detail = parts();
        single_with_detail.sub_segments = vec![SubSegment::unknown()];
        assert!(JourneyLeg::new(single_with_detail).is_err());

        let mut multi_without_detail = parts();
        multi_without_detail.segment_count = 2;
        assert_eq!(
            JourneyLeg::new(multi_without_detail).unwrap_err(),
            DomainError::SubSegmentMismatch {
                count: 2,
                details: 0
            }
        );

        let mut multi = parts();
        multi.segment_count = 2;
        multi.train_id = NO_TRAIN_NUMBER.into();
        multi.sub_segments = vec![SubSegment::unknown(), SubSegment::unknown()];
        assert!(JourneyLeg::new(multi).is_ok());
    }

    #[test]
    fn identity_is_train_and_departure() {
        let a = JourneyLeg::new(parts()).unwrap();

        let mut p = parts();
        p.fares.coach = Some(Price::from_cents(12_000));
        p.elapsed = "3 hr 25 min".into();
        let b = JourneyLeg::new(p).unwrap();
        assert_eq!(a, b);

        let mut p = parts();
        p.departure = at(2024, 3, 29, 7, 6);
        let c = JourneyLeg::new(p).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn attributes_render_in_order() {
        let leg = JourneyLeg::new(parts()).unwrap();
        let row = leg.attributes(&["Train", "Departs", "Arrives", "Coach Price", "Sleeper Price"]);
        assert_eq!(
            row,
            vec![
                "Northeast Regional 171",
                "07:05AM",
                "10:30AM",
                "$49.00",
                ""
            ]
        );
    }

    #[test]
    fn unknown_attribute_is_empty_cell() {
        let leg = JourneyLeg::new(parts()).unwrap();
        assert_eq!(leg.attribute("Wifi"), None);
        assert_eq!(leg.attributes(&["Origin", "Wifi"]), vec!["WAS", ""]);
    }

    #[test]
    fn every_listed_attribute_is_known() {
        let leg = JourneyLeg::new(parts()).unwrap();
        for name in ATTRIBUTE_NAMES {
            assert!(leg.attribute(name).is_some(), "{name} should render");
        }
    }

    #[test]
    fn csv_row_columns() {
        let leg = JourneyLeg::new(parts()).unwrap();
        let row = leg.csv_row();
        let keys: Vec<&str> = row.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, CSV_COLUMNS);
        assert_eq!(row[2].1, "Northeast Regional 171");
        assert_eq!(row[3].1, "Fri 29 07:05AM");
        assert_eq!(row[5].1, "3h 25m");
    }

    #[test]
    fn deserializing_revalidates() {
        let leg = JourneyLeg::new(parts()).unwrap();
        let json = serde_json::to_value(&leg).unwrap();
        let back: JourneyLeg = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, leg);

        let mut sold_out = json;
        sold_out["fares"]["coach"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<JourneyLeg>(sold_out).is_err());
    }

    #[test]
    fn travel_mode_labels() {
        assert_eq!(TravelMode::from_label("TRAIN"), TravelMode::Train);
        assert_eq!(TravelMode::from_label("Thruway Bus"), TravelMode::Bus);
        assert_eq!(TravelMode::from_label("Ferry"), TravelMode::Other);
        assert_eq!(TravelMode::Bus.plural(), "Buses");
    }
}
