//! Station directory error types.

use crate::domain::InvalidStationCode;

/// Errors that can occur when loading the station directory.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Reading the directory file failed
    #[error("failed to read station file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not the expected JSON shape
    #[error("station file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An entry carries an unusable station code
    #[error("station {name:?} has an invalid code: {source}")]
    InvalidCode {
        name: String,
        source: InvalidStationCode,
    },
}
