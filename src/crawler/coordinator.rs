//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop. One control task owns the frontier,
//! the depth tree and the run counters. Each round it pulls a batch out of the
//! frontier, keeps up to `concurrency` requests of that batch in flight, and
//! drains completions one at a time, so every state change happens on the
//! control task and in completion order.

use crate::config::{CrawlerConfig, ScopeConfig, StatusPolicy};
use crate::crawler::fetcher::{FetchError, FetchRequest, FetchedPage, Fetcher};
use crate::crawler::frontier::{CrawlFrontier, UrlId};
use crate::crawler::links::LinkDiscoveryPipeline;
use crate::crawler::render::Renderer;
use crate::crawler::scheduler::{
    build_batch, effective_delay, is_suitable_content_type, DispatchItem, FetchBudget, Pacer,
};
use crate::observer::{CrawlSummary, ObserverHub, ProxyUsage};
use crate::proxy::{ProxyRotator, SelectedProxy};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::{DepthTracker, UrlState, CANCELLED, DISALLOWED_BY_ROBOTS};
use crate::url::{normalize_seed, CrawlProfile};
use crate::RippleError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Stops a running crawl from another task
///
/// The crawl checks the flag before every batch and after every completed
/// request. Requests still in flight are abandoned and their URLs end up
/// processed with the `cancelled` reason.
///
/// The flag stays set until [`reset`](CancelHandle::reset) is called, so a
/// cancelled crawler stops every later run before its first batch.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clears the flag so the next run starts normally
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// State of a single crawl run
struct CrawlRun {
    frontier: CrawlFrontier,
    pipeline: LinkDiscoveryPipeline,
    budget: FetchBudget,
    pacer: Pacer,
    fetched: u64,
    failed: u64,
}

/// The crawl engine
///
/// Built by [`CrawlerBuilder`](crate::crawler::CrawlerBuilder). Each call to
/// [`start_crawling`](Crawler::start_crawling) runs one crawl from scratch.
pub struct Crawler {
    pub(super) config: CrawlerConfig,
    pub(super) product_token: String,
    pub(super) scope: ScopeConfig,
    pub(super) profile: Option<CrawlProfile>,
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) renderer: Option<Arc<dyn Renderer>>,
    pub(super) observers: ObserverHub,
    pub(super) proxies: Option<ProxyRotator>,
    pub(super) cancel: CancelHandle,
}

impl Crawler {
    pub fn builder() -> super::CrawlerBuilder {
        super::CrawlerBuilder::new()
    }

    /// Handle that stops this crawler's runs
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls from `seed` until the frontier is drained, the fetch limit is
    /// reached or the run is cancelled
    ///
    /// # Arguments
    ///
    /// * `seed` - Start URL; a missing scheme defaults to `http`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The run completed
    /// * `Err(RippleError)` - The seed is not a crawlable URL
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ripple_crawl::{CrawlProfile, Crawler};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut crawler = Crawler::builder()
    ///     .max_depth(2)
    ///     .profile(CrawlProfile::same_host("example.com"))
    ///     .build()?;
    /// let summary = crawler.start_crawling("https://example.com/").await?;
    /// println!("fetched {} pages", summary.fetched);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_crawling(&mut self, seed: &str) -> Result<CrawlSummary, RippleError> {
        let started = Instant::now();
        let seed = normalize_seed(seed)?;
        let profile = self
            .profile
            .clone()
            .unwrap_or_else(|| CrawlProfile::from_scope(&self.scope, &seed));

        tracing::info!("Starting crawl of {} with profile {:?}", seed, profile);

        let robots = if self.config.respect_robots {
            Some(fetch_robots(self.fetcher.as_ref(), &seed, &self.product_token).await)
        } else {
            None
        };

        let delay = effective_delay(
            Duration::from_millis(self.config.delay_between_requests),
            robots.as_ref().and_then(RobotsPolicy::crawl_delay),
        );
        if !delay.is_zero() {
            tracing::info!("Spacing requests by {:?}", delay);
        }

        let depth = match self.config.max_depth {
            Some(_) => DepthTracker::new(seed.as_str()),
            None => DepthTracker::disabled(),
        };

        let seed_allowed = robots.as_ref().map_or(true, |r| r.allows(&seed));

        let mut run = CrawlRun {
            frontier: CrawlFrontier::new(profile),
            pipeline: LinkDiscoveryPipeline::new(depth, robots, self.config.max_depth),
            budget: FetchBudget::new(self.config.max_crawl_count),
            pacer: Pacer::new(delay),
            fetched: 0,
            failed: 0,
        };

        if !seed_allowed {
            tracing::warn!("Seed {} is disallowed by robots.txt", seed);
            run.frontier
                .record_skipped(seed.clone(), None, DISALLOWED_BY_ROBOTS);
        } else if !run.frontier.add(seed.clone(), None) {
            tracing::warn!("Seed {} is outside the crawl profile", seed);
        }

        self.run_batches(&mut run).await;
        self.observers.finished();

        let summary = CrawlSummary {
            seed: Some(seed),
            dispatched: run.budget.dispatched(),
            fetched: run.fetched,
            failed: run.failed,
            skipped: run.frontier.skipped_count() as u64,
            discovered: run.frontier.len() as u64,
            pending: run.frontier.count_in(UrlState::Pending) as u64,
            elapsed: started.elapsed(),
            cancelled: self.cancel.is_cancelled(),
        };

        tracing::info!(
            "Crawl completed: {} fetched, {} failed, {} skipped, {} known URLs in {:?}",
            summary.fetched,
            summary.failed,
            summary.skipped,
            summary.discovered,
            summary.elapsed
        );

        Ok(summary)
    }

    async fn run_batches(&self, run: &mut CrawlRun) {
        let mut rounds = 0u64;

        while run.frontier.has_pending_urls() && !run.budget.is_exhausted() {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl cancelled");
                break;
            }

            let batch = build_batch(
                &mut run.frontier,
                &mut run.budget,
                self.config.pool_item_limit,
                &self.observers,
            );
            if batch.is_empty() {
                continue;
            }

            rounds += 1;
            tracing::debug!("Round {}: dispatching {} URLs", rounds, batch.len());

            let proxy = self.proxies.as_ref().and_then(ProxyRotator::select);
            let usage = self
                .dispatch(run, batch, proxy.as_ref().map(SelectedProxy::address))
                .await;

            if let (Some(rotator), Some(selected)) = (&self.proxies, &proxy) {
                rotator.report_usage(selected, &usage, &self.observers);
            }

            if rounds % 10 == 0 {
                tracing::info!(
                    "Progress: {} dispatched, {} pending, {} known",
                    run.budget.dispatched(),
                    run.frontier.count_in(UrlState::Pending),
                    run.frontier.len()
                );
            }
        }
    }

    /// Fetches one batch with bounded parallelism and drains the results
    async fn dispatch(
        &self,
        run: &mut CrawlRun,
        batch: Vec<DispatchItem>,
        proxy: Option<&str>,
    ) -> ProxyUsage {
        let mut usage = ProxyUsage::default();
        let mut in_flight: HashSet<UrlId> = batch.iter().map(|item| item.id).collect();

        let fetcher = Arc::clone(&self.fetcher);
        let renderer = if self.config.execute_javascript {
            self.renderer.clone()
        } else {
            None
        };
        let pacer = run.pacer.clone();
        let proxy = proxy.map(str::to_string);
        let max_body_bytes = self.config.max_response_size;

        let mut results = stream::iter(batch)
            .map(move |item| {
                let fetcher = Arc::clone(&fetcher);
                let renderer = renderer.clone();
                let pacer = pacer.clone();
                let request = FetchRequest {
                    url: item.url.clone(),
                    proxy: proxy.clone(),
                    max_body_bytes,
                };
                async move {
                    pacer.wait_turn().await;
                    let result = fetch_page(fetcher.as_ref(), renderer.as_deref(), request).await;
                    (item, result)
                }
            })
            .buffer_unordered(self.config.concurrency);

        while let Some((item, result)) = results.next().await {
            in_flight.remove(&item.id);
            self.complete(run, item, result, &mut usage);

            if self.cancel.is_cancelled() {
                break;
            }
        }
        drop(results);

        for id in in_flight {
            run.frontier.mark_processed(id, Some(CANCELLED));
        }

        usage
    }

    /// Routes one completed request
    fn complete(
        &self,
        run: &mut CrawlRun,
        item: DispatchItem,
        result: Result<FetchedPage, FetchError>,
        usage: &mut ProxyUsage,
    ) {
        run.frontier.mark_processed(item.id, None);
        let found_on = item.found_on.as_ref();

        match result.and_then(|page| self.check_status(page)) {
            Ok(page) => {
                usage.succeeded += 1;
                run.fetched += 1;
                self.observers.fetched(&item.url, &page, found_on);

                if page.truncated || page.body.len() > self.config.max_response_size {
                    tracing::debug!(
                        "Not following links of {}: response exceeds {} bytes",
                        item.url,
                        self.config.max_response_size
                    );
                } else if !is_suitable_content_type(&page) {
                    tracing::trace!("Not following links of {}: unsuitable content type", item.url);
                } else {
                    run.pipeline.add_from_content(
                        &page.body,
                        &item.url,
                        &mut run.frontier,
                        &run.budget,
                    );
                }
            }
            Err(error) => {
                usage.failed += 1;
                run.failed += 1;
                self.observers.fetch_failed(&item.url, &error, found_on);
            }
        }
    }

    fn check_status(&self, page: FetchedPage) -> Result<FetchedPage, FetchError> {
        let is_error = page.status.is_client_error() || page.status.is_server_error();
        match self.config.status_policy {
            StatusPolicy::FailOnHttpError if is_error => {
                Err(FetchError::HttpStatus(page.status.as_u16()))
            }
            _ => Ok(page),
        }
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("config", &self.config)
            .field("product_token", &self.product_token)
            .field("profile", &self.profile)
            .field("observers", &self.observers)
            .field("proxies", &self.proxies)
            .finish()
    }
}

/// Fetches a page and, when a renderer is given, swaps in the rendered DOM
async fn fetch_page(
    fetcher: &dyn Fetcher,
    renderer: Option<&dyn Renderer>,
    request: FetchRequest,
) -> Result<FetchedPage, FetchError> {
    let mut page = fetcher.fetch(request).await?;

    if let Some(renderer) = renderer {
        if page.status.is_success() {
            match renderer.render(&page.url).await {
                Ok(html) => {
                    page.body = html;
                    page.truncated = false;
                }
                Err(e) => tracing::warn!("Rendering {} failed, using plain body: {}", page.url, e),
            }
        }
    }

    Ok(page)
}
