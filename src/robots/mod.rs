//! Robots.txt handling module
//!
//! The policy of the seed host is fetched once at the start of a run and then
//! consulted for every discovered URL. A robots.txt that cannot be fetched or
//! parsed never aborts the run: it is treated as "allow all".

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::{FetchRequest, Fetcher};
use std::time::Duration;
use url::Url;

/// Upper bound on the robots.txt body that is evaluated
const MAX_ROBOTS_SIZE: usize = 512 * 1024;

/// Longest crawl-delay honored; larger requests are clamped to it
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(30);

/// Robots exclusion policy of the seed host
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    robots: ParsedRobots,
    product_token: String,
}

impl RobotsPolicy {
    /// Builds a policy from a robots.txt document
    pub fn from_content(content: &str, product_token: &str) -> Self {
        Self {
            robots: ParsedRobots::from_content(content),
            product_token: product_token.to_string(),
        }
    }

    /// A policy that allows every URL
    pub fn allow_all() -> Self {
        Self {
            robots: ParsedRobots::allow_all(),
            product_token: String::new(),
        }
    }

    /// Returns true if the URL may be crawled
    pub fn allows(&self, url: &Url) -> bool {
        self.robots.is_allowed(url.as_str(), &self.product_token)
    }

    /// Crawl-delay requested for our product token, if any
    ///
    /// Non-positive values are ignored; values above [`MAX_CRAWL_DELAY`] are
    /// clamped to it.
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots
            .crawl_delay(&self.product_token)
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| {
                Duration::try_from_secs_f64(secs.min(MAX_CRAWL_DELAY.as_secs_f64())).ok()
            })
    }

    pub fn is_allow_all(&self) -> bool {
        self.robots.is_allow_all()
    }
}

/// Location of robots.txt for the host of `url`: `{scheme}://{host[:port]}/robots.txt`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Fetches and parses robots.txt for the host of `seed`
///
/// Transport errors, non-success statuses and oversized bodies all yield an
/// allow-all policy.
pub async fn fetch_robots(fetcher: &dyn Fetcher, seed: &Url, product_token: &str) -> RobotsPolicy {
    let Some(location) = robots_url(seed) else {
        tracing::warn!("Cannot derive robots.txt location from {}", seed);
        return RobotsPolicy::allow_all();
    };

    tracing::debug!("Fetching robots.txt: {}", location);

    let request = FetchRequest {
        url: location.clone(),
        proxy: None,
        max_body_bytes: MAX_ROBOTS_SIZE,
    };

    match fetcher.fetch(request).await {
        Ok(page) if page.status.is_success() && !page.truncated => {
            tracing::info!("Loaded robots.txt from {}", location);
            RobotsPolicy::from_content(&page.body, product_token)
        }
        Ok(page) => {
            tracing::info!(
                "No usable robots.txt at {} (HTTP {}), allowing all",
                location,
                page.status.as_u16()
            );
            RobotsPolicy::allow_all()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch robots.txt at {}: {}, allowing all", location, e);
            RobotsPolicy::allow_all()
        }
    }
}
