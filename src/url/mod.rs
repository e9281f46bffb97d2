//! URL handling module for Ripple-Crawl
//!
//! This module provides URL normalization, host extraction, host pattern
//! matching, and the crawl scope profiles built on top of them.

mod domain;
mod matcher;
mod normalize;
mod profile;

pub use domain::{extract_host, is_absolute_with_host};
pub use matcher::host_matches;
pub use normalize::{has_crawlable_scheme, normalize_seed, normalize_url, CRAWLABLE_SCHEMES};
pub use profile::{CrawlProfile, ScopeFn};

/// Path marker of telephone links that were resolved as relative paths
pub const TELEPHONE_MARKER: &str = "/tel:";

/// Returns true if the URL path contains a telephone-link marker segment
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::is_telephone_link;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/contact/tel:+3212345678").unwrap();
/// assert!(is_telephone_link(&url));
/// ```
pub fn is_telephone_link(url: &::url::Url) -> bool {
    url.path().contains(TELEPHONE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::url::Url;

    #[test]
    fn test_telephone_marker() {
        let base = Url::parse("https://example.com/contact/").unwrap();
        let resolved = base.join("./tel:+1-555-0100").unwrap();
        assert!(is_telephone_link(&resolved));
        assert!(!is_telephone_link(&Url::parse("https://example.com/tell").unwrap()));
        assert!(!is_telephone_link(&Url::parse("https://example.com/hotel:1").unwrap()));
    }
}
