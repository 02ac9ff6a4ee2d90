//! Caching layer for search results.
//!
//! Driving the booking site takes several seconds per search, so identical
//! searches within the TTL are answered from memory. Only successful result
//! sets are cached; a failed search is always retried against the site.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache as MokaCache;

use crate::domain::{ResultSet, StationCode};
use crate::session::SearchRequest;

/// Cache key: (origin, destination, departure date).
type SearchKey = (StationCode, StationCode, NaiveDate);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10 * 60),
            max_capacity: 100,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// Recently fetched result sets.
#[derive(Clone)]
pub struct SearchCache {
    results: MokaCache<SearchKey, Arc<ResultSet>>,
}

impl SearchCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let results = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { results }
    }

    pub async fn get(&self, request: &SearchRequest) -> Option<Arc<ResultSet>> {
        self.results.get(&request.key()).await
    }

    pub async fn insert(&self, request: &SearchRequest, results: Arc<ResultSet>) {
        self.results.insert(request.key(), results).await;
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.results.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.results.invalidate_all();
    }
}
