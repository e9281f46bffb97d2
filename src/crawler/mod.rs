//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded body reads and optional proxies
//! - HTML parsing and link extraction
//! - The frontier of known URLs and batch scheduling
//! - Overall crawl coordination

mod builder;
mod coordinator;
mod fetcher;
mod frontier;
mod links;
mod parser;
mod render;
mod scheduler;

pub use builder::CrawlerBuilder;
pub use coordinator::{CancelHandle, Crawler};
pub use fetcher::{
    build_http_client, FetchError, FetchRequest, FetchedPage, Fetcher, ReqwestFetcher,
};
pub use frontier::{CrawlFrontier, CrawlUrl, UrlId};
pub use links::{DiscoveryOutcome, LinkDiscoveryPipeline};
pub use parser::{extract_links, ExtractedLink};
pub use render::{RenderError, Renderer};
pub use scheduler::{
    build_batch, effective_delay, is_suitable_content_type, DispatchItem, FetchBudget, Pacer,
    SUITABLE_CONTENT_TYPES,
};
