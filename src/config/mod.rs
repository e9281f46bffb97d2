//! Configuration module for Ripple-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The same types back the programmatic [`CrawlerBuilder`](crate::crawler::CrawlerBuilder).
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use concurrency: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, HttpConfig, ProxyConfig, ScopeConfig, ScopeMode, StatusPolicy,
    UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub(crate) use validation::{
    validate_crawler_config, validate_http_config, validate_proxy_config,
    validate_user_agent_config,
};
