//! JavaScript rendering seam
//!
//! When JavaScript execution is enabled the crawler hands every successfully
//! fetched URL to a [`Renderer`] and uses the rendered DOM instead of the raw
//! body for link discovery. No renderer ships with this crate; callers plug in
//! a headless browser driver.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to render {url}: {reason}")]
    Failed { url: String, reason: String },
}

/// Produces the HTML of a page after its scripts have run
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<String, RenderError>;
}
