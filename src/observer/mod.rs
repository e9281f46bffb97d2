//! Observer module for crawl lifecycle events
//!
//! This module handles:
//! - Fanning lifecycle events out to registered observers
//! - Isolating observer panics from the crawl and from each other
//! - Logging and statistics observers shipped with the crate

mod logging;
pub mod stats;
mod traits;

pub use logging::TracingObserver;
pub use stats::{print_statistics, CrawlStatistics, StatsObserver};
pub use traits::{CrawlObserver, CrawlSummary, ProxyUsage};

use crate::crawler::{FetchError, FetchedPage};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use url::Url;

/// Ordered list of observers notified of every lifecycle event
#[derive(Clone, Default)]
pub struct ObserverHub {
    observers: Vec<Arc<dyn CrawlObserver>>,
}

impl ObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn CrawlObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn will_fetch(&self, url: &Url) {
        self.notify("will_fetch", |o| o.will_fetch(url));
    }

    pub fn fetched(&self, url: &Url, page: &FetchedPage, found_on: Option<&Url>) {
        self.notify("fetched", |o| o.fetched(url, page, found_on));
    }

    pub fn fetch_failed(&self, url: &Url, error: &FetchError, found_on: Option<&Url>) {
        self.notify("fetch_failed", |o| o.fetch_failed(url, error, found_on));
    }

    pub fn finished(&self) {
        self.notify("finished", |o| o.finished());
    }

    pub fn proxy_used(&self, proxy: &str, usage: &ProxyUsage) {
        self.notify("proxy_used", |o| o.proxy_used(proxy, usage));
    }

    fn notify<F>(&self, event: &str, call: F)
    where
        F: Fn(&dyn CrawlObserver),
    {
        for (position, observer) in self.observers.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| call(observer.as_ref())));
            if let Err(panic) = outcome {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    "Observer #{} panicked during {}: {}",
                    position,
                    event,
                    message
                );
            }
        }
    }
}

impl std::fmt::Debug for ObserverHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHub")
            .field("observers", &self.observers.len())
            .finish()
    }
}
