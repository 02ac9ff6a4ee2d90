//! Raw result records.
//!
//! Two shapes reach the parser: the JSON the results page leaves in client
//! storage, and rows scraped from the visible result list. Both keep every
//! field optional; validation happens once, in `convert`.

use serde::{Deserialize, Serialize};

/// Text read from one visible result row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedRow {
    /// `"171\nNortheast Regional"` for a named train, or a single line such
    /// as `"Mixed Service"` for multi-service legs.
    pub train_label: Option<String>,
    pub departure_time: Option<String>,
    /// Present when the site flags the departure as delayed or cancelled.
    pub delay_notice: Option<String>,
    pub travel_time: Option<String>,
    /// `"Direct"`, `"2 Segments"`, ...
    pub segment_label: Option<String>,
    pub arrival_time: Option<String>,
    /// Arrival day for overnight legs, e.g. `"Sun, Dec 1"`.
    pub arrival_day: Option<String>,
    pub coach: Option<String>,
    pub business: Option<String>,
    pub sleeper: Option<String>,
}

/// The structured search record kept in client storage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSearch {
    #[serde(default)]
    pub journey_options: Vec<StoredJourneyOption>,
}

/// One journey option in the structured record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredJourneyOption {
    pub id: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date_time: Option<String>,
    pub arrival_date_time: Option<String>,
    pub elapsed_time: Option<String>,

    /// Physical trains and buses making up the option.
    #[serde(default)]
    pub travel_legs: Vec<StoredTravelLeg>,

    #[serde(default)]
    pub fares: Vec<StoredFare>,

    #[serde(default)]
    pub is_delayed: bool,

    #[serde(default)]
    pub is_cancelled: bool,

    #[serde(default)]
    pub intermediate_stops: Vec<String>,
}

/// One physical train or bus in a journey option.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTravelLeg {
    pub service_number: Option<String>,
    pub service_name: Option<String>,
    /// `"TRAIN"`, `"BUS"`, ...
    pub service_type: Option<String>,
    pub operator: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date_time: Option<String>,
    pub arrival_date_time: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub available_inventory: Option<u32>,
}

/// Lowest fare offered in one class.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFare {
    pub fare_class: String,
    pub amount: Option<StoredAmount>,
    #[serde(default)]
    pub sold_out: bool,
}

/// Fare amounts appear both as numbers and as display strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StoredAmount {
    Number(f64),
    Text(String),
}
