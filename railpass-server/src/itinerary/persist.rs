//! Saving and loading the itinerary.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Itinerary, ItineraryError};

/// Format version written by this build.
pub const ITINERARY_FILE_VERSION: u32 = 1;

/// The whole itinerary as one versioned JSON document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItineraryFile {
    pub version: u32,
    pub saved_at_secs: i64,
    pub itinerary: Itinerary,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to access itinerary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("itinerary file is not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("itinerary file version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Invalid(#[from] ItineraryError),
}

impl ItineraryFile {
    pub fn new(itinerary: Itinerary) -> Self {
        Self {
            version: ITINERARY_FILE_VERSION,
            saved_at_secs: Utc::now().timestamp(),
            itinerary,
        }
    }

    /// Parse and validate a saved document.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        #[derive(Deserialize)]
        struct Header {
            version: u32,
        }
        let header: Header = serde_json::from_str(json)?;
        if header.version != ITINERARY_FILE_VERSION {
            return Err(PersistError::UnsupportedVersion(header.version));
        }

        let file: ItineraryFile = serde_json::from_str(json)?;
        file.itinerary.check_invariants()?;
        Ok(file)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write the itinerary to `path`.
pub fn save(itinerary: &Itinerary, path: &Path) -> Result<(), PersistError> {
    let json = ItineraryFile::new(itinerary.clone()).to_json()?;
    std::fs::write(path, json)?;
    info!(
        path = %path.display(),
        segments = itinerary.segments().len(),
        "saved itinerary"
    );
    Ok(())
}

/// Read an itinerary previously written by [`save`].
pub fn load(path: &Path) -> Result<Itinerary, PersistError> {
    let json = std::fs::read_to_string(path)?;
    let file = ItineraryFile::from_json(&json)?;
    info!(
        path = %path.display(),
        segments = file.itinerary.segments().len(),
        "loaded itinerary"
    );
    Ok(file.itinerary)
}
