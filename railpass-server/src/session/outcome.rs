//! Search requests, session states and classified failures.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{StationCode, format_search_date};

/// One origin/destination/date search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: StationCode,
    pub destination: StationCode,
    pub date: NaiveDate,
}

impl SearchRequest {
    pub fn new(origin: StationCode, destination: StationCode, date: NaiveDate) -> Self {
        Self {
            origin,
            destination,
            date,
        }
    }

    /// Identity used for caching.
    pub fn key(&self) -> (StationCode, StationCode, NaiveDate) {
        (self.origin, self.destination, self.date)
    }
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} on {}",
            self.origin,
            self.destination,
            format_search_date(self.date)
        )
    }
}

/// Where a search session is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Loading,
    FormOpen,
    StationsEntered,
    DateEntered,
    Submitted,
    NoService,
    NoTrainsOnDate,
    ResultsReady,
    Failed,
}

/// Why a search produced no results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The browser has not finished starting up
    NotReady,

    /// The search page did not load
    PageUnavailable(String),

    /// A station was not accepted by the form
    StationEntry(String),

    /// The date was not accepted by the form
    DateEntry(String),

    /// The site reports no service between the stations
    NoService(String),

    /// Service exists, but not on the requested date
    NoTrainsOnDate {
        reason: String,
        alternative: Option<String>,
    },

    /// Results could not be located or read
    ExtractionFailed(String),
}

impl SearchError {
    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::NotReady => "not_ready",
            SearchError::PageUnavailable(_) => "page_unavailable",
            SearchError::StationEntry(_) => "station_entry",
            SearchError::DateEntry(_) => "date_entry",
            SearchError::NoService(_) => "no_service",
            SearchError::NoTrainsOnDate { .. } => "no_trains_on_date",
            SearchError::ExtractionFailed(_) => "extraction_failed",
        }
    }

    /// Build a no-trains error from the dialog text.
    ///
    /// The first line is the reason, the second (if any) the suggested date.
    pub fn no_trains_from_dialog(text: &str) -> Self {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let reason = lines
            .next()
            .unwrap_or("No trains are available on this date.")
            .to_string();
        let alternative = lines.next().map(str::to_string);
        SearchError::NoTrainsOnDate {
            reason,
            alternative,
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NotReady => {
                write!(f, "Unable to search right now. Try again in just a few seconds.")
            }
            SearchError::PageUnavailable(msg) => {
                write!(f, "There was an issue with loading the search page: {msg}")
            }
            SearchError::StationEntry(msg) => {
                write!(f, "There was an error entering in station info: {msg}")
            }
            SearchError::DateEntry(msg) => {
                write!(f, "There was an error entering the departure date: {msg}")
            }
            SearchError::NoService(text) => write!(f, "{text}"),
            SearchError::NoTrainsOnDate {
                reason,
                alternative,
            } => {
                write!(f, "{reason}")?;
                if let Some(alt) = alternative {
                    write!(f, "\n{alt}")?;
                }
                Ok(())
            }
            SearchError::ExtractionFailed(msg) => write!(f, "Could not retrieve results: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}
