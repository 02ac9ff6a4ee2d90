//! The search worker.
//!
//! The browser can run one search at a time, so every search goes through a
//! single task that owns the [`SearchSession`]. Handlers talk to it over a
//! channel and wait for the reply.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::browser::BrowserDriver;
use crate::cache::SearchCache;
use crate::domain::ResultSet;

use super::{SearchError, SearchRequest, SearchSession, TracingProgress};

const QUEUE_DEPTH: usize = 16;

type Reply = oneshot::Sender<Result<Arc<ResultSet>, SearchError>>;

struct SearchJob {
    request: SearchRequest,
    reply: Reply,
}

/// Cheap handle for submitting searches to the worker.
#[derive(Clone)]
pub struct SearchWorkerHandle {
    jobs: mpsc::Sender<SearchJob>,
}

impl SearchWorkerHandle {
    /// Queue a search and wait for its results.
    ///
    /// A worker that has shut down reports [`SearchError::NotReady`].
    pub async fn search(&self, request: SearchRequest) -> Result<Arc<ResultSet>, SearchError> {
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(SearchJob { request, reply })
            .await
            .map_err(|_| SearchError::NotReady)?;
        response.await.map_err(|_| SearchError::NotReady)?
    }
}

/// Owns the session and serves queued searches in order.
pub struct SearchWorker<D> {
    session: SearchSession<D>,
    cache: Option<SearchCache>,
    jobs: mpsc::Receiver<SearchJob>,
}

impl<D: BrowserDriver + 'static> SearchWorker<D> {
    /// Start the worker task.
    ///
    /// It stops once every handle has been dropped.
    pub fn spawn(session: SearchSession<D>, cache: Option<SearchCache>) -> SearchWorkerHandle {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = SearchWorker {
            session,
            cache,
            jobs: rx,
        };
        tokio::spawn(worker.run());
        SearchWorkerHandle { jobs: tx }
    }

    async fn run(mut self) {
        while let Some(SearchJob { request, reply }) = self.jobs.recv().await {
            let outcome = self.serve(&request).await;
            if reply.send(outcome).is_err() {
                debug!(%request, "search requester went away");
            }
        }
        debug!("search worker stopped");
    }

    async fn serve(&mut self, request: &SearchRequest) -> Result<Arc<ResultSet>, SearchError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(request).await {
                debug!(%request, "search cache hit");
                return Ok(hit);
            }
        }

        let results = Arc::new(self.session.run(request, &mut TracingProgress::new()).await?);
        if let Some(cache) = &self.cache {
            cache.insert(request, results.clone()).await;
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{FixtureDriver, FixtureNode, SharedBrowser};
    use crate::cache::CacheConfig;
    use crate::session::PageLocators;
    use crate::session::testing::{config, outcome_page, request, result_row, site};

    fn results_site() -> FixtureDriver {
        let loc = PageLocators::default();
        let page = outcome_page(&loc).element(
            FixtureNode::new(loc.results_container.clone())
                .child(result_row(&loc, "171\nNortheast Regional", "7:05a", "10:30a", "$49")),
        );
        FixtureDriver::new(site(&loc, page))
    }

    #[tokio::test(start_paused = true)]
    async fn cached_results_skip_the_browser() {
        let browser = SharedBrowser::new(results_site());
        let cache = SearchCache::new(&CacheConfig::default());
        let handle = SearchWorker::spawn(
            SearchSession::new(browser.clone(), config()),
            Some(cache.clone()),
        );

        let first = handle.search(request()).await.unwrap();
        let second = handle.search(request()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(browser.try_acquire().unwrap().navigations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let loc = PageLocators::default();
        let page = outcome_page(&loc)
            .element(FixtureNode::new(loc.no_service_banner.clone()).with_text("No service."));
        let browser = SharedBrowser::new(FixtureDriver::new(site(&loc, page)));
        let cache = SearchCache::new(&CacheConfig::default());
        let handle = SearchWorker::spawn(
            SearchSession::new(browser.clone(), config()),
            Some(cache.clone()),
        );

        let err = handle.search(request()).await.unwrap_err();
        assert_eq!(err, SearchError::NoService("No service.".into()));
        assert!(cache.get(&request()).await.is_none());
    }

    #[tokio::test]
    async fn not_ready_until_browser_installed() {
        let browser = SharedBrowser::<FixtureDriver>::empty();
        let handle = SearchWorker::spawn(SearchSession::new(browser.clone(), config()), None);

        assert_eq!(
            handle.search(request()).await.unwrap_err(),
            SearchError::NotReady
        );
    }
}
