//! Derived-view cache: read-through views with a TTL, invalidated per country.
//!
//! Invalidation is two-tier. The exact aggregate key is always deleted; the
//! list/detail entries of the country are deleted only when the backend can
//! delete by prefix. Without that capability those entries live until their
//! TTL, which bounds staleness.

pub mod keys;
pub mod memory;
pub mod redis_store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Key/value store holding JSON-encoded views.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Unexpired value for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key` if present. Returns whether something was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Prefix deletion capability; `None` for backends that cannot enumerate keys.
    fn prefix_deleter(&self) -> Option<&dyn PrefixDelete> {
        None
    }
}

#[async_trait]
pub trait PrefixDelete: Send + Sync {
    /// Remove every key starting with `prefix`. Returns the number removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;
}

/// Result of invalidating one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub aggregate_removed: bool,
    /// `None` when the backend has no prefix deletion and scoped entries expire by TTL only.
    pub scoped_removed: Option<usize>,
}

#[derive(Clone)]
pub struct DerivedViewCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl DerivedViewCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Return the cached value for `key`, or run `compute`, store its result for
    /// the configured TTL and return it.
    ///
    /// Cache failures never fail the read: an unreadable entry is a miss and a
    /// failed write only costs the next reader a recompute. Errors from
    /// `compute` are returned as-is and nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!("Cache hit: {}", key);
                    return Ok(value);
                }
                Err(e) => warn!("Discarding undecodable cache entry {}: {}", key, e),
            },
            Ok(None) => debug!("Cache miss: {}", key),
            Err(e) => warn!("Cache read failed for {}, recomputing: {}", key, e),
        }

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(key, raw, self.ttl).await {
                    warn!("Cache write failed for {}: {}", key, e);
                }
            }
            Err(e) => warn!("Could not encode view {} for caching: {}", key, e),
        }

        Ok(value)
    }

    /// Drop every derived view of `country`. Backend errors propagate so the
    /// caller can retry; a missing prefix capability does not.
    pub async fn invalidate_country(&self, country: &str) -> Result<Invalidation, CacheError> {
        let aggregate_removed = self.store.delete(&keys::checklist(country)).await?;

        let scoped_removed = match self.store.prefix_deleter() {
            Some(deleter) => Some(deleter.delete_prefix(&keys::employees_scope(country)).await?),
            None => {
                debug!(
                    "Cache backend cannot delete by prefix; employee views for {} expire by TTL",
                    country
                );
                None
            }
        };

        Ok(Invalidation {
            aggregate_removed,
            scoped_removed,
        })
    }
}
