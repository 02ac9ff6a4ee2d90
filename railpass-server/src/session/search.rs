//! The search state machine.
//!
//! One run drives the booking site through
//! `Loading → FormOpen → StationsEntered → DateEntered → Submitted`, then
//! classifies the outcome and extracts results. Every wait is bounded by a
//! timeout from [`SessionConfig`]; nothing is retried.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::browser::{BrowserDriver, DriverError, ElementRef, Locator, SharedBrowser};
use crate::domain::{JourneyLeg, ResultSet, StationCode, format_search_date};
use crate::parser::{SearchContext, parse_scraped_row, parse_stored_search};

use super::progress::PhaseReporter;
use super::scrape::scrape_row;
use super::{ProgressSink, SearchError, SearchRequest, SessionConfig, SessionState};

const SCROLL_TO_TOP: &str = "window.scrollTo(document.body.scrollHeight, 0)";
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Drives searches against the shared browser.
///
/// The only memory carried between runs is whether the last one failed. A
/// failed or abandoned run forces a full page reload on the next.
pub struct SearchSession<D> {
    browser: SharedBrowser<D>,
    config: SessionConfig,
    state: SessionState,
    trail: Vec<SessionState>,
    returned_error: bool,
}

impl<D: BrowserDriver> SearchSession<D> {
    pub fn new(browser: SharedBrowser<D>, config: SessionConfig) -> Self {
        Self {
            browser,
            config,
            state: SessionState::Idle,
            trail: Vec::new(),
            returned_error: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// States entered by the most recent run, in order.
    pub fn trail(&self) -> &[SessionState] {
        &self.trail
    }

    /// Whether the next run will reload the search page.
    pub fn needs_reload(&self) -> bool {
        self.returned_error
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one search.
    ///
    /// Results are keyed by extraction order. Whatever the outcome, the
    /// browser is released and the session returns to `Idle`.
    pub async fn run(
        &mut self,
        request: &SearchRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<ResultSet, SearchError> {
        self.trail.clear();

        let Some(mut driver) = self.browser.acquire().await else {
            warn!(%request, "search requested before the browser was ready");
            return Err(SearchError::NotReady);
        };

        let must_reload = self.returned_error;
        // Only cleared once this run completes, so a dropped run also reloads
        self.returned_error = true;

        let mut reporter = PhaseReporter::new(progress);
        let ctx = SearchContext {
            origin: request.origin,
            destination: request.destination,
            date: request.date,
            today: Local::now().date_naive(),
        };
        let outcome = self
            .drive(&mut *driver, &ctx, must_reload, &mut reporter)
            .await;

        match &outcome {
            Ok(results) => {
                self.returned_error = false;
                reporter.finish("Done");
                info!(%request, found = results.len(), "search finished");
            }
            Err(e) => {
                if !matches!(
                    self.state,
                    SessionState::NoService | SessionState::NoTrainsOnDate
                ) {
                    self.enter(SessionState::Failed);
                }
                warn!(%request, kind = e.kind(), error = %e, "search failed");
            }
        }

        self.enter(SessionState::Idle);
        outcome
    }

    fn enter(&mut self, state: SessionState) {
        debug!(from = ?self.state, to = ?state, "session transition");
        self.state = state;
        self.trail.push(state);
    }

    async fn drive(
        &mut self,
        driver: &mut D,
        ctx: &SearchContext,
        must_reload: bool,
        progress: &mut PhaseReporter<'_>,
    ) -> Result<ResultSet, SearchError> {
        let config = self.config.clone();
        let loc = &config.locators;

        self.enter(SessionState::Loading);
        progress.step("Searching - loading page", 0.0);
        let new_search = load_page(driver, &config, must_reload)
            .await
            .map_err(|e| SearchError::PageUnavailable(e.to_string()))?
            .ok_or_else(|| SearchError::PageUnavailable("the search form did not appear".into()))?;

        progress.step("Searching - opening input fields", 5.0);
        driver
            .click(&new_search)
            .await
            .map_err(|e| SearchError::PageUnavailable(e.to_string()))?;
        tokio::time::sleep(config.form_settle).await;
        self.enter(SessionState::FormOpen);

        progress.step("Searching - entering stations", 1.0);
        let stations = [
            StationEntry {
                which: "origin",
                code: ctx.origin,
                field: &loc.from_field,
                input: &loc.from_input,
                confirmation: &loc.from_confirmation,
            },
            StationEntry {
                which: "destination",
                code: ctx.destination,
                field: &loc.to_field,
                input: &loc.to_input,
                confirmation: &loc.to_confirmation,
            },
        ];
        for entry in &stations {
            entry.enter(driver, &config).await?;
        }
        self.enter(SessionState::StationsEntered);

        progress.step("Searching - entering travel dates", 2.0);
        let search_button = enter_date(driver, &config, ctx.date).await?;
        self.enter(SessionState::DateEntered);

        progress.step("Searching - retrieving results", 2.0);
        if let Some(body) = driver
            .find(None, &loc.form_body)
            .await
            .map_err(extraction)?
        {
            // Closes the calendar popup
            driver.click(&body).await.map_err(extraction)?;
        }
        driver.click(&search_button).await.map_err(extraction)?;
        self.enter(SessionState::Submitted);

        progress.step("Searching - loading results", 2.0);
        tokio::time::sleep(config.submit_settle).await;
        progress.step("Searching - checking results", 10.0);

        if let Some(banner) = driver
            .wait_for(
                &loc.no_service_banner,
                config.outcome_probe_timeout,
                config.poll_interval,
            )
            .await
            .map_err(extraction)?
        {
            let text = driver.text(&banner).await.map_err(extraction)?;
            self.enter(SessionState::NoService);
            return Err(SearchError::NoService(text.trim().to_string()));
        }

        if let Some(dialog) = driver
            .wait_for(
                &loc.no_trips_dialog,
                config.outcome_probe_timeout,
                config.poll_interval,
            )
            .await
            .map_err(extraction)?
        {
            let message = driver
                .find(Some(&dialog), &loc.no_trips_message)
                .await
                .map_err(extraction)?
                .unwrap_or(dialog);
            let text = driver.text(&message).await.map_err(extraction)?;
            self.enter(SessionState::NoTrainsOnDate);
            return Err(SearchError::no_trains_from_dialog(&text));
        }

        progress.step("Searching - parsing results page", 3.0);
        driver
            .wait_for(
                &loc.results_container,
                config.results_timeout,
                config.poll_interval,
            )
            .await
            .map_err(extraction)?
            .ok_or_else(|| SearchError::ExtractionFailed("no results were shown".into()))?;
        self.enter(SessionState::ResultsReady);

        let legs = match structured_results(driver, &config, ctx).await {
            Some(legs) => legs,
            None => scrape_pages(driver, &config, ctx, progress).await?,
        };

        Ok(legs.into_iter().enumerate().collect())
    }
}

fn extraction(e: DriverError) -> SearchError {
    SearchError::ExtractionFailed(e.to_string())
}

/// Make sure the search page is showing and return its "new search" control.
async fn load_page<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    config: &SessionConfig,
    must_reload: bool,
) -> Result<Option<ElementRef>, DriverError> {
    let current = driver.current_url().await?;
    if must_reload || current != config.search_url {
        debug!(must_reload, %current, "loading search page");
        driver.navigate(&config.search_url).await?;
    }
    driver.run_script(SCROLL_TO_TOP, Vec::new()).await?;

    driver
        .wait_for(
            &config.locators.new_search_button,
            config.page_load_timeout,
            config.poll_interval,
        )
        .await
}

struct StationEntry<'a> {
    which: &'static str,
    code: StationCode,
    field: &'a Locator,
    input: &'a Locator,
    confirmation: &'a Locator,
}

impl StationEntry<'_> {
    /// Type the code and wait for the site to confirm the station.
    async fn enter<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        config: &SessionConfig,
    ) -> Result<(), SearchError> {
        let failed = |e: DriverError| SearchError::StationEntry(e.to_string());
        let which = self.which;

        let field = driver
            .find(None, self.field)
            .await
            .map_err(failed)?
            .ok_or_else(|| SearchError::StationEntry(format!("{which} field not found")))?;
        driver.click(&field).await.map_err(failed)?;

        let input = driver
            .find(None, self.input)
            .await
            .map_err(failed)?
            .ok_or_else(|| SearchError::StationEntry(format!("{which} input not found")))?;
        driver
            .type_text(&input, self.code.as_str())
            .await
            .map_err(failed)?;

        driver
            .wait_for(self.confirmation, config.entry_timeout, config.poll_interval)
            .await
            .map_err(failed)?
            .ok_or_else(|| {
                SearchError::StationEntry(format!(
                    "{which} station {} was not recognised",
                    self.code
                ))
            })?;
        Ok(())
    }
}

/// Fill the date and wait for the search button to become enabled.
async fn enter_date<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    config: &SessionConfig,
    date: NaiveDate,
) -> Result<ElementRef, SearchError> {
    let loc = &config.locators;
    let failed = |e: DriverError| SearchError::DateEntry(e.to_string());
    let date = format_search_date(date);

    let departs = driver
        .find(None, &loc.departs_field)
        .await
        .map_err(failed)?
        .ok_or_else(|| SearchError::DateEntry("departure date field not found".into()))?;
    driver.click(&departs).await.map_err(failed)?;

    let input = driver
        .find(None, &loc.date_input)
        .await
        .map_err(failed)?
        .ok_or_else(|| SearchError::DateEntry("departure date input not found".into()))?;
    driver
        .type_text(&input, &format!("{date}\t"))
        .await
        .map_err(failed)?;

    driver
        .wait_for(&loc.search_button, config.entry_timeout, config.poll_interval)
        .await
        .map_err(failed)?
        .ok_or_else(|| SearchError::DateEntry(format!("{date} was not accepted")))
}

/// Legs from the structured client-storage record, if it yields any.
async fn structured_results<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    config: &SessionConfig,
    ctx: &SearchContext,
) -> Option<Vec<JourneyLeg>> {
    let json = match driver.read_client_storage(&config.storage_key).await {
        Ok(Some(json)) => json,
        Ok(None) => {
            debug!(key = %config.storage_key, "no structured results in client storage");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "could not read client storage");
            return None;
        }
    };

    match parse_stored_search(&json, ctx) {
        Ok(legs) if !legs.is_empty() => {
            debug!(found = legs.len(), "using structured results");
            Some(legs)
        }
        Ok(_) => {
            debug!("structured results had no usable legs");
            None
        }
        Err(e) => {
            debug!(error = %e, "structured results unreadable");
            None
        }
    }
}

/// Scrape the visible result list, page by page.
async fn scrape_pages<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    config: &SessionConfig,
    ctx: &SearchContext,
    progress: &mut PhaseReporter<'_>,
) -> Result<Vec<JourneyLeg>, SearchError> {
    let loc = &config.locators;
    let container = find_container(driver, config).await?;
    let pages = match driver
        .find(Some(&container), &loc.pager)
        .await
        .map_err(extraction)?
    {
        Some(pager) => driver
            .find_all(Some(&pager), &loc.page_item)
            .await
            .map_err(extraction)?
            .len(),
        None => 0,
    };

    if pages == 0 {
        progress.step("Searching - checking page 1", 22.0);
        return read_rows(driver, &container, config, ctx)
            .await
            .map_err(extraction);
    }

    let mut legs = Vec::new();
    for page in 1..=pages {
        progress.step(
            &format!("Searching - checking page {page}"),
            22.0 / pages as f32,
        );
        driver
            .run_script(SCROLL_TO_BOTTOM, Vec::new())
            .await
            .map_err(extraction)?;

        // Earlier references go stale once the list re-renders
        let container = find_container(driver, config).await?;
        let link = match driver
            .find(Some(&container), &loc.pager)
            .await
            .map_err(extraction)?
        {
            Some(pager) => driver
                .find(Some(&pager), &loc.page_link(page))
                .await
                .map_err(extraction)?,
            None => None,
        };
        let link = link
            .ok_or_else(|| SearchError::ExtractionFailed(format!("no link to page {page}")))?;
        driver.click(&link).await.map_err(extraction)?;

        driver
            .wait_for(
                &loc.active_page(page),
                config.pager_timeout,
                config.poll_interval,
            )
            .await
            .map_err(extraction)?
            .ok_or_else(|| SearchError::ExtractionFailed(format!("page {page} did not load")))?;
        tokio::time::sleep(config.page_settle).await;

        let container = find_container(driver, config).await?;
        legs.extend(
            read_rows(driver, &container, config, ctx)
                .await
                .map_err(extraction)?,
        );
    }

    Ok(legs)
}

async fn find_container<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    config: &SessionConfig,
) -> Result<ElementRef, SearchError> {
    driver
        .find(None, &config.locators.results_container)
        .await
        .map_err(extraction)?
        .ok_or_else(|| SearchError::ExtractionFailed("results list disappeared".into()))
}

/// Parse every row of the current page, dropping rows that do not convert.
async fn read_rows<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    container: &ElementRef,
    config: &SessionConfig,
    ctx: &SearchContext,
) -> Result<Vec<JourneyLeg>, DriverError> {
    let rows = driver
        .find_all(Some(container), &config.locators.result_row)
        .await?;

    let mut legs = Vec::with_capacity(rows.len());
    for row in &rows {
        let scraped = match scrape_row(driver, row, &config.locators).await {
            Ok(Some(scraped)) => scraped,
            Ok(None) => continue,
            Err(e) => {
                debug!(error = %e, "skipping unreadable row");
                continue;
            }
        };
        match parse_scraped_row(&scraped, ctx) {
            Ok(leg) => legs.push(leg),
            Err(e) => debug!(reason = %e, "dropping result row"),
        }
    }
    Ok(legs)
}
