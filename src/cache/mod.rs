//! Caching subsystem.
//!
//! - [`key`] derives deterministic store keys from an operation name and its
//!   parameters.
//! - [`store`] defines the [`KeyValueStore`] seam and its backends
//!   ([`MemoryStore`], and `RedisStore` with the `redis` feature).
//! - [`read_through`] implements [`ReadThroughCache`], which the
//!   [`Relay`](crate::Relay) wraps around every upstream call.
//!
//! [`CacheConfig`] holds the per-operation TTLs.

pub mod key;
pub mod read_through;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

pub use key::{CacheKey, NAMESPACE, derive_key};
pub use read_through::ReadThroughCache;
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use store::{KeyValueStore, MemoryStore, StoreError};

/// One hour.
const SHORT_TTL: Duration = Duration::from_secs(3600);
/// Twenty-four hours.
const LONG_TTL: Duration = Duration::from_secs(86_400);

/// Time-to-live per relay operation.
///
/// Search results go stale fastest; topics and categories are kept for a
/// day.
///
/// ```rust
/// # use discourse_relay::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .search_ttl(Duration::from_secs(600))
///     .topic_ttl(Duration::from_secs(3600));
/// assert_eq!(config.search, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Full-text search. Default: 1 hour.
    pub search: Duration,
    /// Post listings. Default: 30 minutes.
    pub posts: Duration,
    /// Topic by id. Default: 24 hours.
    pub topic: Duration,
    /// Category by id. Default: 24 hours.
    pub category: Duration,
    /// Advanced search. Default: 1 hour.
    pub advanced_search: Duration,
    /// Category-scoped search. Default: 1 hour.
    pub search_category: Duration,
    /// Tag-scoped search. Default: 1 hour.
    pub search_tags: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search: SHORT_TTL,
            posts: Duration::from_secs(1800),
            topic: LONG_TTL,
            category: LONG_TTL,
            advanced_search: SHORT_TTL,
            search_category: SHORT_TTL,
            search_tags: SHORT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the same TTL for every operation.
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            search: ttl,
            posts: ttl,
            topic: ttl,
            category: ttl,
            advanced_search: ttl,
            search_category: ttl,
            search_tags: ttl,
        }
    }

    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search = ttl;
        self
    }

    pub fn posts_ttl(mut self, ttl: Duration) -> Self {
        self.posts = ttl;
        self
    }

    pub fn topic_ttl(mut self, ttl: Duration) -> Self {
        self.topic = ttl;
        self
    }

    pub fn category_ttl(mut self, ttl: Duration) -> Self {
        self.category = ttl;
        self
    }

    pub fn advanced_search_ttl(mut self, ttl: Duration) -> Self {
        self.advanced_search = ttl;
        self
    }

    pub fn search_category_ttl(mut self, ttl: Duration) -> Self {
        self.search_category = ttl;
        self
    }

    pub fn search_tags_ttl(mut self, ttl: Duration) -> Self {
        self.search_tags = ttl;
        self
    }
}

/// Which store backs the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Shared redis instance.
    #[default]
    Redis,
    /// In-process moka cache.
    Memory,
    /// No caching.
    None,
}

/// Open the configured store once at startup.
///
/// A redis connection failure is logged and yields a disabled cache; the
/// relay keeps serving without caching for the life of the process.
pub async fn connect(backend: &CacheBackend, redis_url: &str, max_entries: u64) -> ReadThroughCache {
    match backend {
        CacheBackend::None => {
            info!("response caching disabled");
            ReadThroughCache::disabled()
        }
        CacheBackend::Memory => {
            info!(max_entries, "using in-process response cache");
            ReadThroughCache::new(Arc::new(MemoryStore::with_max_entries(max_entries)))
        }
        #[cfg(feature = "redis")]
        CacheBackend::Redis => match RedisStore::connect(redis_url).await {
            Ok(store) => {
                info!(url = redis_url, "redis connected");
                ReadThroughCache::new(Arc::new(store))
            }
            Err(e) => {
                warn!(url = redis_url, error = %e, "redis connection failed, caching disabled");
                ReadThroughCache::disabled()
            }
        },
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => {
            warn!(
                url = redis_url,
                "built without the `redis` feature, caching disabled"
            );
            ReadThroughCache::disabled()
        }
    }
}
