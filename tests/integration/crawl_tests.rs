//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end through the reqwest fetcher.

use ripple_crawl::config::{ScopeConfig, ScopeMode};
use ripple_crawl::crawler::{FetchError, FetchedPage};
use ripple_crawl::observer::{ProxyUsage, StatsObserver};
use ripple_crawl::proxy::SqliteProxyStore;
use ripple_crawl::{CrawlObserver, CrawlerBuilder};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(hrefs: &[&str]) -> ResponseTemplate {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>t</title></head><body>{}</body></html>", anchors),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(hrefs))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/plain"))
        .mount(server)
        .await;
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    let mut paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    paths.sort();
    paths
}

fn same_host() -> ScopeConfig {
    ScopeConfig {
        mode: ScopeMode::SameHost,
        ..ScopeConfig::default()
    }
}

#[tokio::test]
async fn test_depth_limited_same_host_crawl() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    let external = format!("{}/elsewhere", other.uri().replace("127.0.0.1", "localhost"));
    mount_page(&server, "/", &["/a", &external]).await;
    mount_page(&server, "/a", &["/a/b"]).await;
    mount_page(&server, "/a/b", &[]).await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .max_depth(1)
        .scope(same_host())
        .build()
        .unwrap();

    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(requested_paths(&server).await, vec!["/", "/a"]);
    assert!(requested_paths(&other).await.is_empty());
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_single_fetch_budget() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/1", "/2", "/3", "/4", "/5"]).await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .max_crawl_count(1)
        .build()
        .unwrap();

    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(requested_paths(&server).await, vec!["/"]);
    assert_eq!(summary.dispatched, 1);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private/\n").await;
    mount_page(&server, "/", &["/private/secret", "/public"]).await;
    mount_page(&server, "/public", &[]).await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&server)
        .await;

    let mut crawler = CrawlerBuilder::new().build().unwrap();
    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(
        requested_paths(&server).await,
        vec!["/", "/public", "/robots.txt"]
    );
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn test_robots_rules_for_own_product_token() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n",
    )
    .await;
    mount_page(&server, "/", &["/a"]).await;

    let user_agent = ripple_crawl::config::UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        ..Default::default()
    };
    let mut crawler = CrawlerBuilder::new()
        .user_agent(user_agent)
        .build()
        .unwrap();
    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(requested_paths(&server).await, vec!["/robots.txt"]);
    assert_eq!(summary.dispatched, 0);
}

#[tokio::test]
async fn test_http_errors_do_not_stop_the_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/missing", "/broken", "/fine"]).await;
    mount_page(&server, "/fine", &[]).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let stats = Arc::new(StatsObserver::new());
    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .observer(stats.clone())
        .build()
        .unwrap();

    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.pending, 0);

    let stats = stats.snapshot();
    assert_eq!(stats.requested, 4);
    assert_eq!(stats.error_summary.get("http-404"), Some(&1));
    assert_eq!(stats.error_summary.get("http-500"), Some(&1));
    assert!(stats.finished);
}

#[tokio::test]
async fn test_fragments_are_deduplicated() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/doc#intro", "/doc#usage", "/doc", "/#top"]).await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(html_page(&["/doc#again"]))
        .expect(1)
        .mount(&server)
        .await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .build()
        .unwrap();
    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.discovered, 2);
}

#[tokio::test]
async fn test_telephone_and_foreign_scheme_links_are_ignored() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        &["tel:+15551234", "/tel:+15551234", "mailto:a@example.com", "javascript:void(0)"],
    )
    .await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .build()
        .unwrap();
    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(requested_paths(&server).await, vec!["/"]);
    assert_eq!(summary.discovered, 1);
}

#[tokio::test]
async fn test_nofollow_links_are_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="/followed">a</a><a rel="external NoFollow" href="/ignored">b</a>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    mount_page(&server, "/followed", &[]).await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .build()
        .unwrap();
    crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(requested_paths(&server).await, vec!["/", "/followed"]);
}

#[tokio::test]
async fn test_oversized_page_is_fetched_but_not_followed() {
    let server = MockServer::start().await;
    let padding = "x".repeat(4096);
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(r#"<a href="/next">n</a>{}"#, padding),
            "text/html",
        ))
        .mount(&server)
        .await;
    mount_page(&server, "/next", &[]).await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .max_response_size(1024)
        .build()
        .unwrap();
    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(requested_paths(&server).await, vec!["/"]);
}

struct PanickingObserver;

impl CrawlObserver for PanickingObserver {
    fn fetched(&self, _url: &Url, _page: &FetchedPage, _found_on: Option<&Url>) {
        panic!("observer bug");
    }
}

#[tokio::test]
async fn test_panicking_observer_does_not_abort_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a"]).await;
    mount_page(&server, "/a", &[]).await;

    let stats = Arc::new(StatsObserver::new());
    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .observer(Arc::new(PanickingObserver))
        .observer(stats.clone())
        .build()
        .unwrap();

    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(stats.snapshot().fetched(), 2);
}

#[tokio::test]
async fn test_delay_between_requests_spaces_fetches() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a", "/b"]).await;
    mount_page(&server, "/a", &[]).await;
    mount_page(&server, "/b", &[]).await;

    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .concurrency(4)
        .delay_between_requests(Duration::from_millis(100))
        .build()
        .unwrap();

    let started = Instant::now();
    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(summary.fetched, 3);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[derive(Default)]
struct ProxyLog {
    reports: Mutex<Vec<(String, ProxyUsage)>>,
    failures: Mutex<Vec<String>>,
}

impl CrawlObserver for ProxyLog {
    fn fetch_failed(&self, url: &Url, _error: &FetchError, _found_on: Option<&Url>) {
        self.failures.lock().unwrap().push(url.to_string());
    }

    fn proxy_used(&self, proxy: &str, usage: &ProxyUsage) {
        self.reports
            .lock()
            .unwrap()
            .push((proxy.to_string(), *usage));
    }
}

#[tokio::test]
async fn test_unreachable_store_proxy_reports_failed_usage() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteProxyStore::open(&dir.path().join("proxies.db")).unwrap();
    store.upsert("http://127.0.0.1:1", true).unwrap();
    let store = Arc::new(store);

    let log = Arc::new(ProxyLog::default());
    let mut crawler = CrawlerBuilder::new()
        .respect_robots(false)
        .proxy_store(store.clone())
        .observer(log.clone())
        .build()
        .unwrap();

    let summary = crawler.start_crawling(&server.uri()).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert!(requested_paths(&server).await.is_empty());
    assert_eq!(
        log.reports.lock().unwrap().as_slice(),
        &[(
            "http://127.0.0.1:1".to_string(),
            ProxyUsage {
                succeeded: 0,
                failed: 1
            }
        )]
    );
    assert!(store
        .get("http://127.0.0.1:1")
        .unwrap()
        .unwrap()
        .last_used_at
        .is_some());
}
