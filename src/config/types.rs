use serde::Deserialize;

/// Main configuration structure for Ripple-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum number of URLs dispatched in one batch
    #[serde(default)]
    pub pool_item_limit: Option<usize>,

    /// Maximum number of fetches for the whole run
    #[serde(default)]
    pub max_crawl_count: Option<u64>,

    /// Maximum link depth from the seed
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Maximum response body size handed to link discovery (bytes)
    #[serde(default = "default_max_response_size")]
    pub max_response_size: usize,

    /// Minimum time between two request starts (milliseconds)
    #[serde(default)]
    pub delay_between_requests: u64,

    /// Whether robots.txt of the seed host is honored
    #[serde(default = "default_true")]
    pub respect_robots: bool,

    /// Whether page bodies are replaced by a rendered DOM
    #[serde(default)]
    pub execute_javascript: bool,

    /// How HTTP error statuses are reported
    #[serde(default)]
    pub status_policy: StatusPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pool_item_limit: None,
            max_crawl_count: None,
            max_depth: None,
            max_response_size: default_max_response_size(),
            delay_between_requests: 0,
            respect_robots: true,
            execute_javascript: false,
            status_policy: StatusPolicy::default(),
        }
    }
}

/// Decides whether an HTTP response with an error status is a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusPolicy {
    /// 4xx and 5xx responses are reported through `fetch_failed`
    #[default]
    FailOnHttpError,
    /// Every HTTP response is reported through `fetched`
    AcceptAll,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RippleCrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/ripple-crawl".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Total request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connect timeout (seconds)
    #[serde(default = "default_timeout")]
    pub connect_timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_timeout(),
        }
    }
}

/// Which URLs belong to the crawl
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeConfig {
    #[serde(default)]
    pub mode: ScopeMode,

    /// Every one of these substrings must occur in a crawled URL
    #[serde(default)]
    pub must_contain: Vec<String>,

    /// None of these substrings may occur in a crawled URL
    #[serde(default)]
    pub must_not_contain: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    #[default]
    All,
    SameHost,
    Subdomains,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyConfig {
    /// Static pool of proxy IPs, used when the store has no active entry
    #[serde(default)]
    pub ips: Vec<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    pub port: u16,

    /// Path to the SQLite proxy store
    #[serde(default)]
    pub store_path: Option<String>,
}

fn default_concurrency() -> usize {
    10
}

fn default_max_response_size() -> usize {
    2 * 1024 * 1024
}

fn default_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
