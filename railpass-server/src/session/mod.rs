//! Searching the booking site.
//!
//! A [`SearchSession`] fills in the site's search form in a shared browser,
//! classifies what the site answers and extracts the journeys it offers.
//! [`SearchWorker`] runs sessions one at a time on behalf of the web layer.

mod config;
mod locators;
mod outcome;
mod progress;
mod scrape;
mod search;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DEFAULT_SEARCH_URL, DEFAULT_STORAGE_KEY, SessionConfig};
pub use locators::PageLocators;
pub use outcome::{SearchError, SearchRequest, SessionState};
pub use progress::{NoProgress, ProgressSink, TracingProgress};
pub use scrape::scrape_row;
pub use search::SearchSession;
pub use worker::{SearchWorker, SearchWorkerHandle};
