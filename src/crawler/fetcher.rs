//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Routing requests through an optional outbound proxy
//! - Bounded body reads so pathological responses cannot exhaust memory
//! - Error classification

use crate::config::{HttpConfig, UserAgentConfig};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Proxy, StatusCode};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors reported for a single fetch
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("Invalid proxy {proxy}: {reason}")]
    Proxy { proxy: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Classifies a reqwest error
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A single request handed to a [`Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,

    /// Proxy address, `None` for a direct connection
    pub proxy: Option<String>,

    /// Body bytes read before the response is cut off
    pub max_body_bytes: usize,
}

/// A completed HTTP exchange
///
/// Any status counts as a completed exchange; whether an error status is a
/// failed fetch is decided by the scheduler's status policy.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The requested URL (redirects are not followed)
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,

    /// Set when the body was cut off at the size limit
    pub truncated: bool,
}

impl FetchedPage {
    /// Media type of the `Content-Type` header, lowercased and without parameters
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
    }
}

/// Transport seam used by the crawler
///
/// Implementations must be safe to call concurrently; the crawler keeps up to
/// `concurrency` requests in flight on one fetcher.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `http` - Timeouts
/// * `proxy` - Optional proxy address all requests are routed through
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
    proxy: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.timeout))
        .connect_timeout(Duration::from_secs(http.connect_timeout))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true);

    if let Some(address) = proxy {
        builder = builder.proxy(Proxy::all(address)?);
    }

    builder.build()
}

/// Default [`Fetcher`] backed by reqwest
///
/// One client is kept per proxy address so connection pools are reused
/// across batches that share a proxy.
pub struct ReqwestFetcher {
    user_agent: UserAgentConfig,
    http: HttpConfig,
    direct: Client,
    proxied: Mutex<HashMap<String, Client>>,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &UserAgentConfig, http: &HttpConfig) -> Result<Self, ConfigError> {
        let direct = build_http_client(user_agent, http, None)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            user_agent: user_agent.clone(),
            http: http.clone(),
            direct,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, FetchError> {
        let Some(address) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut clients = self
            .proxied
            .lock()
            .map_err(|_| FetchError::Transport("proxy client cache lock poisoned".to_string()))?;

        if let Some(client) = clients.get(address) {
            return Ok(client.clone());
        }

        let client = build_http_client(&self.user_agent, &self.http, Some(address)).map_err(|e| {
            FetchError::Proxy {
                proxy: address.to_string(),
                reason: e.to_string(),
            }
        })?;
        clients.insert(address.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchedPage, FetchError> {
        let client = self.client_for(request.proxy.as_deref())?;

        let mut response = client
            .get(request.url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        let headers = response.headers().clone();

        let mut buf: Vec<u8> = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
        {
            let remaining = request.max_body_bytes.saturating_sub(buf.len());
            if chunk.len() > remaining {
                buf.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            buf.extend_from_slice(&chunk);
        }

        if truncated {
            tracing::debug!(
                "Body of {} cut off at {} bytes",
                request.url,
                request.max_body_bytes
            );
        }

        Ok(FetchedPage {
            url: request.url,
            status,
            headers,
            body: String::from_utf8_lossy(&buf).into_owned(),
            truncated,
        })
    }
}
