//! Builder for configuring relay instances

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::Relay;
use crate::cache::{self, CacheConfig, KeyValueStore, ReadThroughCache};
use crate::config::{Config, Secrets};
use crate::upstream::{Credentials, ForumClient};
use crate::{ForumApi, RelayError, Result};

/// Builder for configuring relay instances.
///
/// ```rust
/// # use std::sync::Arc;
/// # use discourse_relay::{Relay, cache::MemoryStore};
/// let relay = Relay::builder()
///     .base_url("https://forum.example.com")
///     .credentials("api-key", "system")
///     .store(Arc::new(MemoryStore::new()))
///     .build()
///     .unwrap();
/// assert!(relay.caching_enabled());
/// ```
#[derive(Default)]
pub struct RelayBuilder {
    base_url: Option<String>,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
    upstream: Option<Arc<dyn ForumApi>>,
    cache: ReadThroughCache,
    ttl: CacheConfig,
}

impl Relay {
    /// Create a new builder for configuring the relay.
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    /// Build a relay from loaded configuration, connecting the configured
    /// store.
    ///
    /// A store that cannot be reached is not an error; the relay starts with
    /// caching disabled.
    pub async fn from_config(config: &Config, secrets: &Secrets) -> Result<Relay> {
        let base_url = config.upstream.base_url.clone().ok_or_else(|| {
            RelayError::Configuration(
                "no upstream URL configured; set [upstream] base_url or DISCOURSE_URL".to_string(),
            )
        })?;

        let mut builder = Relay::builder()
            .base_url(base_url)
            .cache_config(config.cache.ttl.to_cache_config()?);

        match secrets.credentials() {
            Some(creds) => builder = builder.credentials(creds.api_key, creds.api_username),
            None => warn!("no API credentials configured, requests will be anonymous"),
        }

        if let Some(secs) = config.upstream.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let cache = cache::connect(
            &config.cache.backend,
            &config.cache.redis_url,
            config.cache.max_entries,
        )
        .await;

        builder.cache(cache).build()
    }
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forum base URL, e.g. `https://forum.example.com`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// API key and username sent with every upstream request.
    pub fn credentials(mut self, api_key: impl Into<String>, api_username: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(api_key, api_username));
        self
    }

    /// Per-request upstream timeout. None by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an existing [`ForumApi`] as the upstream instead of building a
    /// [`ForumClient`]. Takes precedence over `base_url`.
    pub fn upstream(mut self, upstream: Arc<dyn ForumApi>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Cache responses in `store`.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.cache = ReadThroughCache::new(store);
        self
    }

    /// Use a prepared cache (possibly disabled).
    pub fn cache(mut self, cache: ReadThroughCache) -> Self {
        self.cache = cache;
        self
    }

    /// Per-operation TTLs.
    pub fn cache_config(mut self, ttl: CacheConfig) -> Self {
        self.ttl = ttl;
        self
    }

    /// Build the relay.
    ///
    /// Fails if neither an upstream nor a base URL was given.
    pub fn build(self) -> Result<Relay> {
        let upstream: Arc<dyn ForumApi> = match (self.upstream, self.base_url) {
            (Some(upstream), _) => upstream,
            (None, Some(url)) => {
                let mut client = ForumClient::new(url)?;
                if let Some(creds) = self.credentials {
                    client = client.credentials(creds);
                }
                if let Some(timeout) = self.timeout {
                    client = client.timeout(timeout)?;
                }
                Arc::new(client)
            }
            (None, None) => {
                return Err(RelayError::Configuration(
                    "no upstream configured".to_string(),
                ));
            }
        };

        Ok(Relay::new(upstream, self.cache, self.ttl))
    }
}
