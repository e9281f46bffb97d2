//! Link discovery
//!
//! Turns the body of a fetched page into new frontier entries. Candidates go
//! through, in order: nofollow and scheme filtering, normalization, the depth
//! tree, robots or depth admission, telephone-link exclusion and the fetch
//! budget, before the frontier applies its own scope and dedup gate.

use crate::crawler::frontier::CrawlFrontier;
use crate::crawler::parser::extract_links;
use crate::crawler::scheduler::FetchBudget;
use crate::robots::RobotsPolicy;
use crate::state::{DepthTracker, DISALLOWED_BY_ROBOTS};
use crate::url::{has_crawlable_scheme, is_telephone_link, normalize_url};
use url::Url;

/// Counts for one [`LinkDiscoveryPipeline::add_from_content`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    /// Anchors found in the document
    pub extracted: usize,

    /// New pending frontier entries
    pub enqueued: usize,

    /// New frontier entries recorded as disallowed by robots.txt
    pub disallowed: usize,
}

/// Expands the frontier from fetched content
#[derive(Debug)]
pub struct LinkDiscoveryPipeline {
    depth: DepthTracker,
    robots: Option<RobotsPolicy>,
    max_depth: Option<u32>,
}

impl LinkDiscoveryPipeline {
    /// Creates a pipeline for one run
    ///
    /// # Arguments
    ///
    /// * `depth` - Depth tree rooted at the seed, or a disabled tracker
    /// * `robots` - The seed host's policy, `None` when robots.txt is not honored
    /// * `max_depth` - Deepest admitted link when robots.txt is not honored
    pub fn new(depth: DepthTracker, robots: Option<RobotsPolicy>, max_depth: Option<u32>) -> Self {
        Self {
            depth,
            robots,
            max_depth,
        }
    }

    pub fn depth_tracker(&self) -> &DepthTracker {
        &self.depth
    }

    /// Extracts the links of `content` and submits the survivors to the frontier
    ///
    /// When robots.txt is honored it alone decides admission; the depth limit
    /// applies only when it is not. Processing stops at the first admitted link
    /// found while the fetch budget is exhausted; the rest are discarded.
    ///
    /// # Arguments
    ///
    /// * `content` - The page body
    /// * `found_on` - Normalized URL of the page, also the resolution base
    /// * `frontier` - Receives new entries
    /// * `budget` - The run's fetch budget
    pub fn add_from_content(
        &mut self,
        content: &str,
        found_on: &Url,
        frontier: &mut CrawlFrontier,
        budget: &FetchBudget,
    ) -> DiscoveryOutcome {
        let links = extract_links(content, found_on);
        let mut outcome = DiscoveryOutcome {
            extracted: links.len(),
            ..DiscoveryOutcome::default()
        };

        let candidates = links
            .into_iter()
            .filter(|link| !link.is_nofollow())
            .filter(|link| has_crawlable_scheme(&link.url))
            .map(|link| normalize_url(&link.url));

        for url in candidates {
            let Some(node) = self.depth.insert(url.as_str(), found_on.as_str()) else {
                tracing::trace!("Dropping {}: parent {} not in depth tree", url, found_on);
                continue;
            };

            if let Some(robots) = &self.robots {
                if !robots.allows(&url) {
                    tracing::debug!("Disallowed by robots.txt: {}", url);
                    if frontier.record_skipped(url, Some(found_on.clone()), DISALLOWED_BY_ROBOTS) {
                        outcome.disallowed += 1;
                    }
                    continue;
                }
            } else if self.max_depth.map_or(false, |max| node.depth > max) {
                tracing::trace!("Dropping {}: depth {} exceeds limit", url, node.depth);
                continue;
            }

            if is_telephone_link(&url) {
                continue;
            }

            if budget.is_exhausted() {
                tracing::debug!(
                    "Fetch limit reached, discarding remaining links on {}",
                    found_on
                );
                break;
            }

            if frontier.add(url, Some(found_on.clone())) {
                outcome.enqueued += 1;
            }
        }

        if outcome.enqueued > 0 {
            tracing::debug!("Enqueued {} new URLs from {}", outcome.enqueued, found_on);
        }

        outcome
    }
}
