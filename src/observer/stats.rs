//! Statistics gathered from crawl events
//!
//! This module provides an observer that counts lifecycle events and a
//! function that displays the collected statistics.

use super::traits::{CrawlObserver, CrawlSummary, ProxyUsage};
use crate::crawler::{FetchError, FetchedPage};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Number of fetches announced through `will_fetch`
    pub requested: u64,

    /// Count of completed fetches by HTTP status code
    pub pages_by_status: HashMap<u16, u64>,

    /// Count of failed fetches by error kind
    pub error_summary: HashMap<String, u64>,

    /// Bytes of body received over all completed fetches
    pub bytes_received: u64,

    /// Number of bodies cut off at the size limit
    pub truncated: u64,

    /// Per-proxy usage totals
    pub proxies: HashMap<String, ProxyUsage>,

    pub finished: bool,
}

impl CrawlStatistics {
    pub fn fetched(&self) -> u64 {
        self.pages_by_status.values().sum()
    }

    pub fn failed(&self) -> u64 {
        self.error_summary.values().sum()
    }
}

/// Observer that aggregates [`CrawlStatistics`]
#[derive(Debug, Default)]
pub struct StatsObserver {
    stats: Mutex<CrawlStatistics>,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the statistics collected so far
    pub fn snapshot(&self) -> CrawlStatistics {
        match self.stats.lock() {
            Ok(stats) => stats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut CrawlStatistics),
    {
        match self.stats.lock() {
            Ok(mut stats) => apply(&mut stats),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }
}

impl CrawlObserver for StatsObserver {
    fn will_fetch(&self, _url: &Url) {
        self.update(|stats| stats.requested += 1);
    }

    fn fetched(&self, _url: &Url, page: &FetchedPage, _found_on: Option<&Url>) {
        self.update(|stats| {
            *stats.pages_by_status.entry(page.status.as_u16()).or_insert(0) += 1;
            stats.bytes_received += page.body.len() as u64;
            if page.truncated {
                stats.truncated += 1;
            }
        });
    }

    fn fetch_failed(&self, _url: &Url, error: &FetchError, _found_on: Option<&Url>) {
        let kind = match error {
            FetchError::Timeout => "timeout".to_string(),
            FetchError::Connect(_) => "connect".to_string(),
            FetchError::HttpStatus(code) => format!("http-{}", code),
            FetchError::Body(_) => "body".to_string(),
            FetchError::Proxy { .. } => "proxy".to_string(),
            FetchError::Transport(_) => "transport".to_string(),
        };
        self.update(|stats| *stats.error_summary.entry(kind).or_insert(0) += 1);
    }

    fn finished(&self) {
        self.update(|stats| stats.finished = true);
    }

    fn proxy_used(&self, proxy: &str, usage: &ProxyUsage) {
        self.update(|stats| {
            let total = stats.proxies.entry(proxy.to_string()).or_default();
            total.succeeded += usage.succeeded;
            total.failed += usage.failed;
        });
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The run summary returned by the crawler
/// * `stats` - Event statistics from a [`StatsObserver`]
pub fn print_statistics(summary: &CrawlSummary, stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    if let Some(seed) = &summary.seed {
        println!("  Seed: {}", seed);
    }
    println!("  URLs discovered: {}", summary.discovered);
    println!("  Fetches dispatched: {}", summary.dispatched);
    println!("  Skipped without fetch: {}", summary.skipped);
    println!("  Still pending: {}", summary.pending);
    println!("  Bytes received: {}", stats.bytes_received);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    if summary.cancelled {
        println!("  Run was cancelled");
    }
    println!();

    if !stats.pages_by_status.is_empty() {
        println!("Pages by Status:");
        let mut status_counts: Vec<_> = stats.pages_by_status.iter().collect();
        status_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (status, count) in status_counts {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    if !stats.error_summary.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.error_summary.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.proxies.is_empty() {
        println!("Proxies ({}):", stats.proxies.len());
        for (proxy, usage) in &stats.proxies {
            println!("  - {}: {} ok, {} failed", proxy, usage.succeeded, usage.failed);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        summary.success_rate(),
        summary.fetched,
        summary.fetched + summary.failed
    );
}
