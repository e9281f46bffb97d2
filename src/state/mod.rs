//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: where a frontier entry is in its lifecycle (pending, processing, processed)
//! - `DepthTracker`: the discovery tree that gives each URL its depth from the seed

mod depth;
mod url_state;

pub use depth::{DepthNode, DepthTracker, NodeId};
pub use url_state::{UrlState, CANCELLED, DISALLOWED_BY_ROBOTS, SHOULD_NOT_CRAWL};
