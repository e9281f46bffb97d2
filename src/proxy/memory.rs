use crate::proxy::traits::{ProxyError, ProxyRecord, ProxyResult, ProxyStore};
use chrono::Utc;
use std::sync::Mutex;

/// In-memory proxy store
#[derive(Debug, Default)]
pub struct MemoryProxyStore {
    proxies: Mutex<Vec<ProxyRecord>>,
}

impl MemoryProxyStore {
    pub fn new(proxies: Vec<ProxyRecord>) -> Self {
        Self {
            proxies: Mutex::new(proxies),
        }
    }

    /// Current state of every proxy, in insertion order
    pub fn records(&self) -> ProxyResult<Vec<ProxyRecord>> {
        Ok(self
            .proxies
            .lock()
            .map_err(|_| ProxyError::LockPoisoned)?
            .clone())
    }
}

impl ProxyStore for MemoryProxyStore {
    fn active_oldest_used(&self) -> ProxyResult<Option<ProxyRecord>> {
        let proxies = self.proxies.lock().map_err(|_| ProxyError::LockPoisoned)?;
        // `None` sorts before any timestamp; ties keep insertion order
        Ok(proxies
            .iter()
            .filter(|p| p.active)
            .min_by_key(|p| p.last_used_at)
            .cloned())
    }

    fn record_usage(&self, proxy: &ProxyRecord) -> ProxyResult<()> {
        let mut proxies = self.proxies.lock().map_err(|_| ProxyError::LockPoisoned)?;
        let record = proxies
            .iter_mut()
            .find(|p| p.address == proxy.address)
            .ok_or_else(|| ProxyError::NotFound(proxy.address.clone()))?;
        record.last_used_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_least_recently_used() {
        let store = MemoryProxyStore::new(vec![
            ProxyRecord::new("http://a:1"),
            ProxyRecord::new("http://b:1"),
        ]);

        let first = store.active_oldest_used().unwrap().unwrap();
        assert_eq!(first.address, "http://a:1");
        store.record_usage(&first).unwrap();

        let second = store.active_oldest_used().unwrap().unwrap();
        assert_eq!(second.address, "http://b:1");
    }

    #[test]
    fn test_inactive_is_never_selected() {
        let mut inactive = ProxyRecord::new("http://a:1");
        inactive.active = false;
        let store = MemoryProxyStore::new(vec![inactive]);
        assert!(store.active_oldest_used().unwrap().is_none());
    }
}
