//! Builder for [`Crawler`]

use crate::config::{
    validate_crawler_config, validate_http_config, validate_proxy_config,
    validate_user_agent_config, Config, CrawlerConfig, HttpConfig, ProxyConfig, ScopeConfig,
    StatusPolicy, UserAgentConfig,
};
use crate::crawler::coordinator::{CancelHandle, Crawler};
use crate::crawler::fetcher::{Fetcher, ReqwestFetcher};
use crate::crawler::render::Renderer;
use crate::observer::{CrawlObserver, ObserverHub};
use crate::proxy::{ProxyRotator, ProxyStore, SqliteProxyStore};
use crate::url::CrawlProfile;
use crate::ConfigError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Configures and assembles a [`Crawler`]
///
/// Starts from the defaults of every configuration section. A builder
/// seeded from a loaded [`Config`] can still be adjusted before `build`.
#[derive(Default)]
pub struct CrawlerBuilder {
    crawler: CrawlerConfig,
    user_agent: UserAgentConfig,
    http: HttpConfig,
    scope: ScopeConfig,
    proxy: Option<ProxyConfig>,
    profile: Option<CrawlProfile>,
    proxy_store: Option<Arc<dyn ProxyStore>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    renderer: Option<Arc<dyn Renderer>>,
    observers: ObserverHub,
    cancel: CancelHandle,
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every section from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            crawler: config.crawler.clone(),
            user_agent: config.user_agent.clone(),
            http: config.http.clone(),
            scope: config.scope.clone(),
            proxy: config.proxy.clone(),
            ..Self::default()
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.crawler.concurrency = concurrency;
        self
    }

    /// Caps the number of URLs dispatched per batch
    pub fn pool_item_limit(mut self, limit: usize) -> Self {
        self.crawler.pool_item_limit = Some(limit);
        self
    }

    /// Caps the number of fetches for a run
    pub fn max_crawl_count(mut self, count: u64) -> Self {
        self.crawler.max_crawl_count = Some(count);
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.crawler.max_depth = Some(depth);
        self
    }

    pub fn max_response_size(mut self, bytes: usize) -> Self {
        self.crawler.max_response_size = bytes;
        self
    }

    /// Minimum time between two request starts
    pub fn delay_between_requests(mut self, delay: Duration) -> Self {
        self.crawler.delay_between_requests = delay.as_millis() as u64;
        self
    }

    pub fn respect_robots(mut self, respect: bool) -> Self {
        self.crawler.respect_robots = respect;
        self
    }

    /// Replaces page bodies with the renderer's output; needs a renderer
    pub fn execute_javascript(mut self, execute: bool) -> Self {
        self.crawler.execute_javascript = execute;
        self
    }

    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.crawler.status_policy = policy;
        self
    }

    pub fn user_agent(mut self, user_agent: UserAgentConfig) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Scope rules used when no explicit profile is set
    pub fn scope(mut self, scope: ScopeConfig) -> Self {
        self.scope = scope;
        self
    }

    /// Overrides the profile derived from the scope rules
    pub fn profile(mut self, profile: CrawlProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Uses `store` instead of opening the configured `store-path`
    pub fn proxy_store(mut self, store: Arc<dyn ProxyStore>) -> Self {
        self.proxy_store = Some(store);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observers.register(observer);
        self
    }

    /// Replaces the default reqwest fetcher
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Shares an existing cancel handle with the crawler
    pub fn cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validates the settings and assembles the crawler
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(ConfigError)` - A setting is out of range, JavaScript execution
    ///   was requested without a renderer, or the proxy store could not be opened
    pub fn build(self) -> Result<Crawler, ConfigError> {
        validate_crawler_config(&self.crawler)?;
        validate_user_agent_config(&self.user_agent)?;
        validate_http_config(&self.http)?;
        if let Some(proxy) = &self.proxy {
            validate_proxy_config(proxy)?;
        }

        if self.crawler.execute_javascript && self.renderer.is_none() {
            return Err(ConfigError::Validation(
                "execute_javascript requires a renderer".to_string(),
            ));
        }

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(ReqwestFetcher::new(&self.user_agent, &self.http)?),
        };

        let proxy_store = match (self.proxy_store, &self.proxy) {
            (Some(store), _) => Some(store),
            (None, Some(ProxyConfig {
                store_path: Some(path),
                ..
            })) => {
                let store = SqliteProxyStore::open(Path::new(path))
                    .map_err(|e| ConfigError::ProxyStore(format!("{}: {}", path, e)))?;
                Some(Arc::new(store) as Arc<dyn ProxyStore>)
            }
            (None, _) => None,
        };

        let proxies = match (&self.proxy, proxy_store) {
            (Some(config), store) => Some(ProxyRotator::from_config(config, store)),
            (None, Some(store)) => Some(ProxyRotator::new(Some(store), Vec::new())),
            (None, None) => None,
        };

        Ok(Crawler {
            config: self.crawler,
            product_token: self.user_agent.crawler_name.clone(),
            scope: self.scope,
            profile: self.profile,
            fetcher,
            renderer: self.renderer,
            observers: self.observers,
            proxies,
            cancel: self.cancel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::proxy::MemoryProxyStore;

    #[test]
    fn test_defaults_build() {
        let crawler = CrawlerBuilder::new().build().unwrap();
        assert_eq!(crawler.config().concurrency, 10);
        assert!(crawler.config().respect_robots);
        assert!(crawler.proxies.is_none());
        assert_eq!(crawler.product_token, "RippleCrawl");
    }

    #[test]
    fn test_setters_apply() {
        let crawler = CrawlerBuilder::new()
            .concurrency(3)
            .pool_item_limit(7)
            .max_crawl_count(50)
            .max_depth(2)
            .delay_between_requests(Duration::from_millis(250))
            .respect_robots(false)
            .status_policy(StatusPolicy::AcceptAll)
            .build()
            .unwrap();

        let config = crawler.config();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.pool_item_limit, Some(7));
        assert_eq!(config.max_crawl_count, Some(50));
        assert_eq!(config.max_depth, Some(2));
        assert_eq!(config.delay_between_requests, 250);
        assert!(!config.respect_robots);
        assert_eq!(config.status_policy, StatusPolicy::AcceptAll);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(CrawlerBuilder::new().concurrency(0).build().is_err());
        assert!(CrawlerBuilder::new().pool_item_limit(0).build().is_err());
    }

    #[test]
    fn test_javascript_needs_renderer() {
        let result = CrawlerBuilder::new().execute_javascript(true).build();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_from_config() {
        let config = parse_config(
            r#"
[crawler]
concurrency = 4
max-depth = 3

[user-agent]
crawler-name = "TestBot"
crawler-version = "0.1"
contact-url = "https://example.com/bot"
contact-email = "bot@example.com"

[proxy]
ips = ["10.0.0.1"]
port = 3128
"#,
        )
        .unwrap();

        let crawler = CrawlerBuilder::from_config(&config).build().unwrap();
        assert_eq!(crawler.config().concurrency, 4);
        assert_eq!(crawler.config().max_depth, Some(3));
        assert_eq!(crawler.product_token, "TestBot");
        assert_eq!(
            crawler.proxies.as_ref().map(|p| p.pool().to_vec()),
            Some(vec!["https://10.0.0.1:3128".to_string()])
        );
    }

    #[test]
    fn test_proxy_store_opened_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.db");
        let proxy = ProxyConfig {
            ips: Vec::new(),
            username: String::new(),
            password: String::new(),
            port: 3128,
            store_path: Some(path.to_string_lossy().into_owned()),
        };

        let crawler = CrawlerBuilder::new().proxy(proxy).build().unwrap();
        assert!(crawler.proxies.as_ref().map_or(false, |p| p.has_store()));
        assert!(path.exists());
    }

    #[test]
    fn test_explicit_store_without_proxy_section() {
        let store = Arc::new(MemoryProxyStore::default());
        let crawler = CrawlerBuilder::new().proxy_store(store).build().unwrap();
        assert!(crawler.proxies.as_ref().map_or(false, |p| p.has_store()));
    }
}
