//! Station directory.
//!
//! Maps the station display keys shown to users (`"WAS | Washington Union
//! Station, DC"`) to station codes and places, loaded from a JSON file.

mod error;
mod table;

use crate::domain::StationCode;

pub use error::StationError;
pub use table::{StationEntry, StationTable, display_key};

/// Station lookups by display key.
pub trait StationDirectory: Send + Sync {
    fn code_for(&self, display_name: &str) -> Option<StationCode>;

    /// `"City, State"` of a station.
    fn city_state_for(&self, display_name: &str) -> Option<String>;
}
