//! Search session configuration.

use std::time::Duration;

use super::PageLocators;

/// Default booking-site search page.
pub const DEFAULT_SEARCH_URL: &str = "https://www.amtrak.com/tickets/departure.html";

/// Client-storage key holding the structured results record.
pub const DEFAULT_STORAGE_KEY: &str = "searchresults";

/// Timeouts, settle delays and selectors for a search session.
///
/// Every wait the session performs is bounded by one of these timeouts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub search_url: String,
    pub storage_key: String,

    /// Wait for the search page's "new search" control.
    pub page_load_timeout: Duration,
    /// Wait for each station/date confirmation.
    pub entry_timeout: Duration,
    /// Wait for the no-service banner and the no-trips dialog.
    pub outcome_probe_timeout: Duration,
    /// Wait for the results container.
    pub results_timeout: Duration,
    /// Wait for each result page to become active.
    pub pager_timeout: Duration,

    /// Pause after opening the form.
    pub form_settle: Duration,
    /// Pause after submitting.
    pub submit_settle: Duration,
    /// Pause after switching result pages.
    pub page_settle: Duration,

    pub poll_interval: Duration,

    pub locators: PageLocators,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            page_load_timeout: Duration::from_secs(5),
            entry_timeout: Duration::from_secs(5),
            outcome_probe_timeout: Duration::from_secs(1),
            results_timeout: Duration::from_secs(3),
            pager_timeout: Duration::from_secs(5),
            form_settle: Duration::from_secs(1),
            submit_settle: Duration::from_secs(2),
            page_settle: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            locators: PageLocators::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_entry_timeout(mut self, timeout: Duration) -> Self {
        self.entry_timeout = timeout;
        self
    }

    pub fn with_results_timeout(mut self, timeout: Duration) -> Self {
        self.results_timeout = timeout;
        self
    }

    pub fn with_locators(mut self, locators: PageLocators) -> Self {
        self.locators = locators;
        self
    }
}
