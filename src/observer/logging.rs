use super::traits::{CrawlObserver, ProxyUsage};
use crate::crawler::{FetchError, FetchedPage};
use url::Url;

/// Observer that logs every lifecycle event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn will_fetch(&self, url: &Url) {
        tracing::debug!("Fetching {}", url);
    }

    fn fetched(&self, url: &Url, page: &FetchedPage, found_on: Option<&Url>) {
        tracing::info!(
            "Fetched {} (HTTP {}, {} bytes{}){}",
            url,
            page.status.as_u16(),
            page.body.len(),
            if page.truncated { ", truncated" } else { "" },
            found_on
                .map(|parent| format!(" found on {}", parent))
                .unwrap_or_default()
        );
    }

    fn fetch_failed(&self, url: &Url, error: &FetchError, found_on: Option<&Url>) {
        match found_on {
            Some(parent) => tracing::warn!("Failed to fetch {} (found on {}): {}", url, parent, error),
            None => tracing::warn!("Failed to fetch {}: {}", url, error),
        }
    }

    fn finished(&self) {
        tracing::info!("Crawl finished");
    }

    fn proxy_used(&self, proxy: &str, usage: &ProxyUsage) {
        tracing::debug!(
            "Proxy {} served {} requests ({} failed)",
            proxy,
            usage.total(),
            usage.failed
        );
    }
}
