//! In-memory DNS cache.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    ips: Vec<IpAddr>,
    expires_at: Instant,
}

/// Hostname → addresses cache with a fixed TTL.
///
/// Expired entries are evicted lazily when their key is looked up, and in
/// bulk by [`DnsCache::purge_expired`]. Safe for concurrent use.
pub struct DnsCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl DnsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached addresses for `host` if present and not expired.
    pub fn get(&self, host: &str) -> Option<Vec<IpAddr>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(host) {
                Some(entry) if entry.expires_at > now => return Some(entry.ips.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict, re-checking in case another task refreshed it meanwhile.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(host) {
            if entry.expires_at > now {
                return Some(entry.ips.clone());
            }
            entries.remove(host);
            log::trace!("Evicted expired DNS cache entry for {host}");
        }
        None
    }

    pub fn insert(&self, host: &str, ips: Vec<IpAddr>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            host.to_string(),
            CacheEntry {
                ips,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn remove(&self, host: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(host);
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
