use crate::UrlError;
use url::Url;

/// Schemes the crawler is able to fetch
pub const CRAWLABLE_SCHEMES: &[&str] = &["http", "https"];

/// Normalizes a discovered URL into its frontier key
///
/// Only the fragment is cleared: scheme, host, path and query are kept as
/// they are, so two URLs are the same frontier entry exactly when their
/// fragment-less serializations are equal.
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/page?a=1#section").unwrap();
/// assert_eq!(normalize_url(&url).as_str(), "https://example.com/page?a=1");
/// ```
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// Parses and normalizes the seed URL of a crawl
///
/// # Normalization Steps
///
/// 1. A missing scheme defaults to `http`
/// 2. Only `http` and `https` are accepted
/// 3. The URL must have a host
/// 4. An empty path becomes `/`
/// 5. The fragment is removed
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::normalize_seed;
///
/// let url = normalize_seed("example.com").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/");
/// ```
pub fn normalize_seed(seed: &str) -> Result<Url, UrlError> {
    let seed = seed.trim();

    // "localhost:8080" would otherwise parse with "localhost" as its scheme
    let with_scheme = if seed.contains("://") {
        seed.to_string()
    } else {
        format!("http://{}", seed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !has_crawlable_scheme(&url) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    Ok(normalize_url(&url))
}

/// Returns true for `http` and `https` URLs
pub fn has_crawlable_scheme(url: &Url) -> bool {
    CRAWLABLE_SCHEMES.contains(&url.scheme())
}
