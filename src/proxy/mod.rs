//! Outbound proxy selection
//!
//! This module handles:
//! - Choosing one proxy per batch, least recently used first
//! - Falling back to a random address from a static pool
//! - Feeding usage back to the proxy store and to observers
//! - SQLite and in-memory proxy stores

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryProxyStore;
pub use sqlite::SqliteProxyStore;
pub use traits::{ProxyError, ProxyRecord, ProxyResult, ProxyStore};

use crate::config::ProxyConfig;
use crate::observer::{ObserverHub, ProxyUsage};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// The proxy chosen for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedProxy {
    /// Entry from the proxy store; its usage is reported back
    Stored(ProxyRecord),

    /// Address picked from the static pool
    Pooled(String),
}

impl SelectedProxy {
    pub fn address(&self) -> &str {
        match self {
            Self::Stored(record) => &record.address,
            Self::Pooled(address) => address,
        }
    }
}

/// Formats a static pool entry as a proxy URL
///
/// Credentials are left out when no username is configured.
pub fn pool_address(username: &str, password: &str, ip: &str, port: u16) -> String {
    if username.is_empty() {
        format!("https://{}:{}", ip, port)
    } else {
        format!("https://{}:{}@{}:{}", username, password, ip, port)
    }
}

/// Picks an outbound proxy per batch
pub struct ProxyRotator {
    store: Option<Arc<dyn ProxyStore>>,
    pool: Vec<String>,
}

impl ProxyRotator {
    /// Creates a rotator over an optional store and a list of pool addresses
    pub fn new(store: Option<Arc<dyn ProxyStore>>, pool: Vec<String>) -> Self {
        Self { store, pool }
    }

    /// Creates a rotator from a `[proxy]` section
    pub fn from_config(config: &ProxyConfig, store: Option<Arc<dyn ProxyStore>>) -> Self {
        let pool = config
            .ips
            .iter()
            .map(|ip| pool_address(&config.username, &config.password, ip.trim(), config.port))
            .collect();
        Self::new(store, pool)
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Chooses the proxy for the next batch
    ///
    /// The store's least recently used active entry wins. Without one, or
    /// when the store fails, an address is drawn uniformly from the pool.
    /// Returns `None` when neither source has anything to offer.
    pub fn select(&self) -> Option<SelectedProxy> {
        if let Some(store) = &self.store {
            match store.active_oldest_used() {
                Ok(Some(record)) => return Some(SelectedProxy::Stored(record)),
                Ok(None) => tracing::debug!("Proxy store has no active entry"),
                Err(e) => tracing::warn!("Proxy store lookup failed: {}", e),
            }
        }

        self.pool
            .choose(&mut rand::thread_rng())
            .cloned()
            .map(SelectedProxy::Pooled)
    }

    /// Reports how a batch went through `selected`
    ///
    /// Only store-backed proxies are reported; a failure to update the store
    /// is logged and does not affect the crawl.
    pub fn report_usage(&self, selected: &SelectedProxy, usage: &ProxyUsage, observers: &ObserverHub) {
        let SelectedProxy::Stored(record) = selected else {
            return;
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.record_usage(record) {
                tracing::warn!("Failed to record usage of proxy {}: {}", record.address, e);
            }
        }

        observers.proxy_used(&record.address, usage);
    }
}

impl std::fmt::Debug for ProxyRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyRotator")
            .field("store", &self.store.is_some())
            .field("pool", &self.pool.len())
            .finish()
    }
}
