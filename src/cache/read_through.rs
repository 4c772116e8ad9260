//! Read-through cache over a [`KeyValueStore`].
//!
//! [`ReadThroughCache::get_or_fetch`] consults the store, falls through to a
//! caller-supplied fetch on miss, and writes the result back with a TTL.
//! Store failures are logged and counted, then treated as misses (on read)
//! or dropped (on write). They are never returned to the caller.
//!
//! A cache built with [`ReadThroughCache::disabled`] has no store: every
//! call is a miss and nothing is written, which makes it equivalent to
//! calling the fetch directly. Front ends cannot tell the difference.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::CacheKey;
use super::store::KeyValueStore;
use crate::Result;
use crate::telemetry;

/// Read-through wrapper around an optional store handle.
#[derive(Clone, Default)]
pub struct ReadThroughCache {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl ReadThroughCache {
    /// Cache backed by `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Degraded cache: always miss, never write.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Whether a store is attached.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Return the value cached under `key`, or run `fetch`, cache its
    /// success for `ttl`, and return it.
    ///
    /// `fetch` runs at most once. Its error is returned unchanged and
    /// nothing is written.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &CacheKey, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let operation = key.operation().to_string();

        if let Some(value) = self.lookup(key).await {
            debug!(key = %key, "cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => operation).increment(1);
            return Ok(value);
        }

        debug!(key = %key, "cache miss");
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation).increment(1);

        let value = fetch().await?;
        self.write(key, &value, ttl).await;
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let store = self.store.as_ref()?;

        let raw = match store.get(key.as_str()).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(store = store.name(), key = %key, error = %e, "cache get failed");
                metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "op" => "get").increment(1);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "cache value not serializable");
                return;
            }
        };

        if let Err(e) = store.set_ex(key.as_str(), payload, ttl).await {
            warn!(store = store.name(), key = %key, error = %e, "cache set failed");
            metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "op" => "set").increment(1);
        }
    }
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("store", &self.store.as_ref().map(|s| s.name()))
            .finish()
    }
}
