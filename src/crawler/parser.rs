//! HTML parser for extracting candidate links
//!
//! This module turns a document string into the list of link targets found in
//! its `<a href>` elements, resolved to absolute URLs. Filtering (scheme,
//! scope, robots, depth) happens later in the discovery pipeline.

use scraper::{Html, Selector};
use url::Url;

/// A link target found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL, resolved against the document base
    pub url: Url,

    /// Raw `rel` attribute of the anchor
    pub rel: Option<String>,
}

impl ExtractedLink {
    /// Returns true if the anchor declares `rel="nofollow"`
    pub fn is_nofollow(&self) -> bool {
        self.rel.as_deref().map_or(false, |rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("nofollow"))
        })
    }
}

/// Extracts all anchor targets from an HTML document
///
/// A `<base href>` element, when present and resolvable, replaces `page_url`
/// as the resolution base. Targets that cannot be resolved to a URL are
/// dropped.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The URL the document was fetched from
///
/// # Returns
///
/// The links in document order, duplicates included
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &page_url);
/// assert_eq!(links[0].url.as_str(), "https://example.com/page");
/// assert!(links[0].is_nofollow());
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let url = base.join(href).ok()?;
            Some(ExtractedLink {
                url,
                rel: element.value().attr("rel").map(str::to_string),
            })
        })
        .collect()
}

/// Resolution base of the document
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn urls(html: &str) -> Vec<String> {
        extract_links(html, &base_url())
            .into_iter()
            .map(|link| link.url.to_string())
            .collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://example.com/other"]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="other">Link</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://example.com/other"]);
    }

    #[test]
    fn test_base_href_overrides_page_url() {
        let html = r#"<html><head><base href="https://cdn.example.com/docs/"></head>
            <body><a href="intro">Intro</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://cdn.example.com/docs/intro"]);
    }

    #[test]
    fn test_relative_base_href() {
        let html = r#"<html><head><base href="/v2/"></head>
            <body><a href="guide">Guide</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://example.com/v2/guide"]);
    }

    #[test]
    fn test_other_schemes_are_kept_for_filtering() {
        let html = r#"<html><body>
            <a href="mailto:test@example.com">Email</a>
            <a href="javascript:void(0)">Script</a>
        </body></html>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url.scheme(), "mailto");
        assert_eq!(links[1].url.scheme(), "javascript");
    }

    #[test]
    fn test_unresolvable_and_empty_links_are_dropped() {
        let html = r#"<html><body>
            <a href="">Empty</a>
            <a href="http://[::1">Broken</a>
            <a href="/ok">Ok</a>
        </body></html>"#;
        assert_eq!(urls(html), vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_nofollow_detection() {
        let html = r#"<html><body>
            <a href="/a" rel="nofollow">A</a>
            <a href="/b" rel="noopener NoFollow">B</a>
            <a href="/c" rel="noopener">C</a>
            <a href="/d">D</a>
        </body></html>"#;
        let flags: Vec<bool> = extract_links(html, &base_url())
            .iter()
            .map(ExtractedLink::is_nofollow)
            .collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn test_fragments_are_preserved_at_extraction() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        assert_eq!(urls(html), vec!["https://example.com/page#section"]);
    }

    #[test]
    fn test_anchors_without_href_are_ignored() {
        let html = r#"<html><body><a name="top">Top</a><a href="/x">X</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://example.com/x"]);
    }
}
