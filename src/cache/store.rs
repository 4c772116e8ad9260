//! Key-value store backends for the read-through cache.
//!
//! Every store command returns an explicit [`StoreError`] on failure. Callers
//! outside the cache module never see these: [`ReadThroughCache`] turns them
//! into misses.
//!
//! [`ReadThroughCache`]: super::ReadThroughCache

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

/// Default maximum number of entries held by [`MemoryStore`].
pub const DEFAULT_MEMORY_MAX_ENTRIES: u64 = 10_000;

/// TTL applied to writes that ask for zero. Matches the smallest TTL redis
/// `SETEX` accepts.
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// Zero becomes [`MIN_TTL`]; other TTLs pass through.
fn effective_ttl(ttl: Duration) -> Duration {
    if ttl.is_zero() { MIN_TTL } else { ttl }
}

/// A failed store command.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (connect failed, connection dropped).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but rejected or failed the command.
    #[error("store command failed: {0}")]
    Command(String),
}

/// Minimal async key-value store with TTL writes.
///
/// Values are JSON text. Implementations must be safe to share across
/// requests; independent keys may be read and written concurrently, and for
/// a single key the last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch the value stored under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous entry, expiring
    /// `ttl` from now.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;
}

// ============================================================================
// In-process store
// ============================================================================

#[derive(Clone)]
struct StoredValue {
    payload: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was written with. Rewrites reset it.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process store backed by moka.
///
/// Suitable for a single relay process, and for tests. Entries expire
/// passively after their TTL; least-recently-used entries are evicted once
/// the capacity is reached.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MEMORY_MAX_ENTRIES)
    }

    /// Create a store holding at most `max` entries.
    pub fn with_max_entries(max: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }

    /// Number of live entries (approximate, as reported by moka).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).await.map(|v| v.payload))
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        self.entries
            .insert(
                key.to_string(),
                StoredValue {
                    payload: value,
                    ttl: effective_ttl(ttl),
                },
            )
            .await;
        Ok(())
    }
}

// ============================================================================
// Redis
// ============================================================================

#[cfg(feature = "redis")]
pub use self::redis_store::RedisStore;

#[cfg(feature = "redis")]
mod redis_store {
    use std::time::Duration;

    use async_trait::async_trait;
    use redis::AsyncCommands;
    use redis::aio::ConnectionManager;

    use super::{KeyValueStore, StoreError};

    /// Redis-backed store shared across relay processes.
    ///
    /// The connection manager is cloned per command; it multiplexes over one
    /// connection and reconnects in the background after a drop. Commands
    /// issued while disconnected fail with [`StoreError::Unavailable`].
    #[derive(Clone)]
    pub struct RedisStore {
        manager: ConnectionManager,
    }

    impl RedisStore {
        /// Connect to `url` (e.g. `redis://localhost:6379`).
        pub async fn connect(url: &str) -> Result<Self, StoreError> {
            let client = redis::Client::open(url)
                .map_err(|e| StoreError::Unavailable(format!("redis client: {e}")))?;
            let manager = ConnectionManager::new(client)
                .await
                .map_err(|e| StoreError::Unavailable(format!("redis connect: {e}")))?;
            Ok(Self { manager })
        }
    }

    fn map_err(command: &str, err: redis::RedisError) -> StoreError {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            StoreError::Unavailable(format!("redis {command}: {err}"))
        } else {
            StoreError::Command(format!("redis {command}: {err}"))
        }
    }

    /// SETEX takes whole seconds; round up so short TTLs never become 0.
    pub(super) fn ttl_secs(ttl: Duration) -> u64 {
        let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        secs.max(1)
    }

    #[async_trait]
    impl KeyValueStore for RedisStore {
        fn name(&self) -> &str {
            "redis"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            let mut conn = self.manager.clone();
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(|e| map_err("GET", e))
        }

        async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
            let mut conn = self.manager.clone();
            conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
                .await
                .map_err(|e| map_err("SETEX", e))
        }
    }
}
