//! Observer trait and associated types
//!
//! This module defines the listener interface notified of crawl lifecycle
//! events, and the run summary returned by a crawl.

use crate::crawler::{FetchError, FetchedPage};
use std::time::Duration;
use url::Url;

/// Outcome counts for the requests of one batch sent through a proxy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyUsage {
    pub succeeded: u64,
    pub failed: u64,
}

impl ProxyUsage {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Trait for crawl observers
///
/// Every method has a no-op default, so an observer implements only the
/// events it cares about. Observers cannot influence the crawl; a panic in
/// one is logged and the run continues. Implementations must be thread-safe.
pub trait CrawlObserver: Send + Sync {
    /// Called right before a URL is handed to the HTTP client
    fn will_fetch(&self, _url: &Url) {}

    /// Called when a fetch completed successfully
    ///
    /// # Arguments
    ///
    /// * `url` - The fetched URL
    /// * `page` - Status, headers and (possibly truncated) body
    /// * `found_on` - The page the URL was discovered on, `None` for the seed
    fn fetched(&self, _url: &Url, _page: &FetchedPage, _found_on: Option<&Url>) {}

    /// Called when a fetch failed; the URL is not retried
    fn fetch_failed(&self, _url: &Url, _error: &FetchError, _found_on: Option<&Url>) {}

    /// Called once when the run ends
    fn finished(&self) {}

    /// Called after a batch went through a store-backed proxy
    fn proxy_used(&self, _proxy: &str, _usage: &ProxyUsage) {}
}

/// Summary of a finished crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Seed URL after normalization
    pub seed: Option<Url>,

    /// URLs handed to the HTTP client
    pub dispatched: u64,

    /// Fetches reported through `fetched`
    pub fetched: u64,

    /// Fetches reported through `fetch_failed`
    pub failed: u64,

    /// URLs processed without a fetch (scope, robots, cancellation)
    pub skipped: u64,

    /// URLs known to the frontier at the end of the run
    pub discovered: u64,

    /// URLs still pending when the run stopped
    pub pending: u64,

    pub elapsed: Duration,

    /// Set when the run was stopped through a cancel handle
    pub cancelled: bool,
}

impl CrawlSummary {
    /// Returns the success rate as a percentage of completed fetches
    pub fn success_rate(&self) -> f64 {
        let completed = self.fetched + self.failed;
        if completed == 0 {
            return 0.0;
        }
        (self.fetched as f64 / completed as f64) * 100.0
    }
}
