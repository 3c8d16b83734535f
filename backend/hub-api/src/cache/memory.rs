use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheError, CacheStore, PrefixDelete};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-process cache. Used for single-instance deployments and tests.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    prefix_delete: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            prefix_delete: true,
        }
    }

    /// A store that cannot enumerate its keys: only exact deletes, so
    /// country-scoped entries are left to expire.
    pub fn exact_only() -> Self {
        Self {
            prefix_delete: false,
            ..Self::new()
        }
    }

    /// Number of unexpired entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        // Clean up expired entries periodically
        if entries.len() > 10000 {
            entries.retain(|_, e| !e.is_expired(now));
        }

        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .write()
            .await
            .remove(key)
            .is_some_and(|e| !e.is_expired(now)))
    }

    fn prefix_deleter(&self) -> Option<&dyn PrefixDelete> {
        if self.prefix_delete {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl PrefixDelete for MemoryCache {
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        let mut expired = 0;
        entries.retain(|key, entry| {
            if !key.starts_with(prefix) {
                return true;
            }
            if entry.is_expired(now) {
                expired += 1;
            }
            false
        });
        Ok(before - entries.len() - expired)
    }
}
