//! Batch building, fetch budget and request pacing
//!
//! This module handles:
//! - Pulling bounded batches of dispatchable URLs out of the frontier
//! - The run-wide fetch budget
//! - Spacing request starts by the configured delay
//! - Integrating robots.txt crawl delays

use crate::crawler::fetcher::FetchedPage;
use crate::crawler::frontier::{CrawlFrontier, UrlId};
use crate::observer::ObserverHub;
use crate::state::SHOULD_NOT_CRAWL;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Content types whose bodies are handed to link discovery
pub const SUITABLE_CONTENT_TYPES: [&str; 3] = ["text/html", "application/xhtml+xml", "text/plain"];

/// A URL taken out of the frontier for fetching
#[derive(Debug, Clone)]
pub struct DispatchItem {
    pub id: UrlId,
    pub url: Url,
    pub found_on: Option<Url>,
}

/// Run-wide fetch counter and its optional limit
///
/// The counter moves once per URL handed to the HTTP client, never per
/// discovery.
#[derive(Debug, Clone)]
pub struct FetchBudget {
    dispatched: u64,
    limit: Option<u64>,
}

impl FetchBudget {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            dispatched: 0,
            limit,
        }
    }

    pub fn record_dispatch(&mut self) {
        self.dispatched += 1;
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Returns true once the limit, if any, has been reached
    pub fn is_exhausted(&self) -> bool {
        self.limit.map_or(false, |limit| self.dispatched >= limit)
    }
}

/// Spaces consecutive request starts by at least a fixed delay
///
/// Clones share the same schedule, so the delay holds across all in-flight
/// requests of a run.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    next_start: Arc<Mutex<Option<Instant>>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_start: Arc::new(Mutex::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until the next request may start and reserves that slot
    pub async fn wait_turn(&self) {
        if self.delay.is_zero() {
            return;
        }

        // The lock is held while sleeping so waiters start one at a time
        let mut next_start = self.next_start.lock().await;
        if let Some(at) = *next_start {
            if at > Instant::now() {
                tokio::time::sleep_until(at).await;
            }
        }
        *next_start = Some(Instant::now() + self.delay);
    }
}

/// Calculates the effective delay between request starts
///
/// This takes the maximum of:
/// - The configured delay
/// - The robots.txt crawl delay (if specified)
pub fn effective_delay(configured: Duration, robots_delay: Option<Duration>) -> Duration {
    std::cmp::max(configured, robots_delay.unwrap_or(Duration::ZERO))
}

/// Pulls the next batch of URLs to fetch out of the frontier
///
/// Pending URLs that fail the crawl profile are processed with the
/// `should-not-crawl` reason. Pulling stops when the frontier has no pending
/// URL left, the fetch budget is exhausted, or the batch holds
/// `pool_item_limit` URLs. Every URL put in the batch is announced to the
/// observers, counted against the budget and moved to processing.
///
/// # Arguments
///
/// * `frontier` - The run's frontier
/// * `budget` - The run's fetch budget
/// * `pool_item_limit` - Maximum batch size, `None` for unbounded
/// * `observers` - Receives `will_fetch` for every batched URL
pub fn build_batch(
    frontier: &mut CrawlFrontier,
    budget: &mut FetchBudget,
    pool_item_limit: Option<usize>,
    observers: &ObserverHub,
) -> Vec<DispatchItem> {
    let mut batch = Vec::new();

    while let Some(record) = frontier.next_pending() {
        let id = record.id;

        if !frontier.profile().should_crawl(&record.url) {
            tracing::debug!("Skipping {}: outside the crawl profile", record.url);
            frontier.mark_processed(id, Some(SHOULD_NOT_CRAWL));
            continue;
        }

        if budget.is_exhausted() {
            break;
        }

        if pool_item_limit.map_or(false, |limit| batch.len() >= limit) {
            break;
        }

        let item = DispatchItem {
            id,
            url: record.url.clone(),
            found_on: record.found_on.clone(),
        };

        observers.will_fetch(&item.url);
        budget.record_dispatch();
        frontier.mark_processing(id);
        batch.push(item);
    }

    batch
}

/// Returns true if the page body may be handed to link discovery
///
/// Bodies without a `Content-Type` header are accepted.
pub fn is_suitable_content_type(page: &FetchedPage) -> bool {
    page.content_type()
        .map_or(true, |ct| SUITABLE_CONTENT_TYPES.contains(&ct.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::UrlState;
    use crate::url::CrawlProfile;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::StatusCode;

    fn frontier_with(paths: &[&str]) -> CrawlFrontier {
        let mut frontier = CrawlFrontier::new(CrawlProfile::All);
        for path in paths {
            frontier.add(Url::parse(&format!("http://example.com{}", path)).unwrap(), None);
        }
        frontier
    }

    fn page_with_content_type(content_type: Option<&'static str>) -> FetchedPage {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        FetchedPage {
            url: Url::parse("http://example.com/").unwrap(),
            status: StatusCode::OK,
            headers,
            body: String::new(),
            truncated: false,
        }
    }

    #[test]
    fn test_batch_respects_pool_item_limit() {
        let mut frontier = frontier_with(&["/1", "/2", "/3"]);
        let mut budget = FetchBudget::new(None);
        let hub = ObserverHub::new();

        let batch = build_batch(&mut frontier, &mut budget, Some(2), &hub);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].url.path(), "/1");
        assert_eq!(batch[1].url.path(), "/2");
        assert_eq!(budget.dispatched(), 2);
        assert_eq!(frontier.count_in(UrlState::Processing), 2);
        assert_eq!(frontier.count_in(UrlState::Pending), 1);
    }

    #[test]
    fn test_batch_stops_at_fetch_limit() {
        let mut frontier = frontier_with(&["/1", "/2", "/3"]);
        let mut budget = FetchBudget::new(Some(1));
        let hub = ObserverHub::new();

        let batch = build_batch(&mut frontier, &mut budget, None, &hub);
        assert_eq!(batch.len(), 1);
        assert!(budget.is_exhausted());

        // Nothing more once the budget is spent
        assert!(build_batch(&mut frontier, &mut budget, None, &hub).is_empty());
        assert_eq!(frontier.count_in(UrlState::Pending), 2);
    }

    #[test]
    fn test_batch_skips_out_of_profile_urls() {
        use std::sync::atomic::{AtomicBool, Ordering};

        // Scope that starts rejecting /2 after admission
        let narrowed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&narrowed);
        let profile =
            CrawlProfile::custom(move |url: &Url| !flag.load(Ordering::SeqCst) || url.path() != "/2");

        let mut frontier = CrawlFrontier::new(profile);
        for path in ["/1", "/2", "/3"] {
            frontier.add(Url::parse(&format!("http://example.com{}", path)).unwrap(), None);
        }
        narrowed.store(true, Ordering::SeqCst);

        let mut budget = FetchBudget::new(None);
        let batch = build_batch(&mut frontier, &mut budget, None, &ObserverHub::new());

        let paths: Vec<&str> = batch.iter().map(|item| item.url.path()).collect();
        assert_eq!(paths, vec!["/1", "/3"]);
        assert_eq!(budget.dispatched(), 2);

        let skipped = frontier
            .find(&Url::parse("http://example.com/2").unwrap())
            .unwrap();
        assert_eq!(skipped.state, UrlState::Processed);
        assert_eq!(skipped.reason.as_deref(), Some(SHOULD_NOT_CRAWL));
        assert!(!frontier.has_pending_urls());
    }

    #[test]
    fn test_budget() {
        let mut budget = FetchBudget::new(Some(2));
        assert!(!budget.is_exhausted());
        budget.record_dispatch();
        budget.record_dispatch();
        assert!(budget.is_exhausted());

        let unlimited = FetchBudget::new(None);
        assert!(!unlimited.is_exhausted());
    }

    #[test]
    fn test_effective_delay_uses_config() {
        assert_eq!(
            effective_delay(Duration::from_millis(1000), None),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_effective_delay_with_robots_delay() {
        assert_eq!(
            effective_delay(Duration::from_millis(1000), Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_effective_delay_robots_smaller_than_config() {
        assert_eq!(
            effective_delay(Duration::from_millis(1000), Some(Duration::from_millis(500))),
            Duration::from_millis(1000)
        );
    }

    #[tokio::test]
    async fn test_pacer_spaces_request_starts() {
        let pacer = Pacer::new(Duration::from_millis(50));
        let started = Instant::now();

        pacer.wait_turn().await;
        pacer.clone().wait_turn().await;
        pacer.wait_turn().await;

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_pacer_without_delay_does_not_wait() {
        let pacer = Pacer::new(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..10 {
            pacer.wait_turn().await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_suitable_content_types() {
        assert!(is_suitable_content_type(&page_with_content_type(None)));
        assert!(is_suitable_content_type(&page_with_content_type(Some(
            "text/html; charset=utf-8"
        ))));
        assert!(is_suitable_content_type(&page_with_content_type(Some(
            "application/xhtml+xml"
        ))));
        assert!(is_suitable_content_type(&page_with_content_type(Some(
            "text/plain"
        ))));
        assert!(!is_suitable_content_type(&page_with_content_type(Some(
            "image/png"
        ))));
        assert!(!is_suitable_content_type(&page_with_content_type(Some(
            "application/pdf"
        ))));
    }
}
