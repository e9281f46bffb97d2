//! Crawl scope predicates

use crate::config::{ScopeConfig, ScopeMode};
use crate::url::{extract_host, host_matches, is_absolute_with_host};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Custom scope rule
pub type ScopeFn = dyn Fn(&Url) -> bool + Send + Sync;

/// Decides whether a URL belongs to the crawl
///
/// A profile is a pure predicate: it never performs I/O and always answers
/// the same for the same URL, since it is consulted both when a URL is
/// discovered and again when it is about to be dispatched.
#[derive(Clone)]
pub enum CrawlProfile {
    /// Every URL is in scope
    All,

    /// URLs on the seed host, with substring requirements
    SameHost {
        host: String,
        must_contain: Vec<String>,
        must_not_contain: Vec<String>,
    },

    /// URLs on the seed host or any of its subdomains
    Subdomains {
        host: String,
        must_contain: Vec<String>,
        must_not_contain: Vec<String>,
    },

    /// Caller-supplied rule
    Custom(Arc<ScopeFn>),
}

impl CrawlProfile {
    /// Same-host profile without substring requirements
    pub fn same_host(host: impl Into<String>) -> Self {
        Self::SameHost {
            host: host.into().to_lowercase(),
            must_contain: Vec::new(),
            must_not_contain: Vec::new(),
        }
    }

    /// Wraps a closure as a profile
    pub fn custom<F>(rule: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(rule))
    }

    /// Builds the profile described by a `[scope]` section for a given seed
    pub fn from_scope(scope: &ScopeConfig, seed: &Url) -> Self {
        let host = extract_host(seed).unwrap_or_default();
        match scope.mode {
            ScopeMode::All => Self::All,
            ScopeMode::SameHost => Self::SameHost {
                host,
                must_contain: scope.must_contain.clone(),
                must_not_contain: scope.must_not_contain.clone(),
            },
            ScopeMode::Subdomains => Self::Subdomains {
                host,
                must_contain: scope.must_contain.clone(),
                must_not_contain: scope.must_not_contain.clone(),
            },
        }
    }

    /// Returns true if `url` is in scope
    pub fn should_crawl(&self, url: &Url) -> bool {
        match self {
            Self::All => true,
            Self::SameHost {
                host,
                must_contain,
                must_not_contain,
            } => {
                extract_host(url).as_deref() == Some(host.as_str())
                    && passes_filters(url, must_contain, must_not_contain)
            }
            Self::Subdomains {
                host,
                must_contain,
                must_not_contain,
            } => {
                extract_host(url).map_or(false, |candidate| {
                    host_matches(&format!("*.{}", host), &candidate)
                }) && passes_filters(url, must_contain, must_not_contain)
            }
            Self::Custom(rule) => rule(url),
        }
    }
}

impl Default for CrawlProfile {
    fn default() -> Self {
        Self::All
    }
}

impl fmt::Debug for CrawlProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::SameHost { host, .. } => write!(f, "SameHost({})", host),
            Self::Subdomains { host, .. } => write!(f, "Subdomains(*.{})", host),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

fn passes_filters(url: &Url, must_contain: &[String], must_not_contain: &[String]) -> bool {
    if !is_absolute_with_host(url) {
        return false;
    }

    let text = url.as_str();

    must_contain.iter().all(|needle| text.contains(needle.as_str()))
        && !must_not_contain
            .iter()
            .any(|needle| text.contains(needle.as_str()))
}
