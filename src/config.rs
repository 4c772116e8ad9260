//! Configuration loading for relayd and relay-mcp.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.discourse-relay/config.toml` (user)
//! 3. `/etc/discourse-relay/config.toml` (system)
//! 4. built-in defaults
//!
//! Environment variables then override the file: `DISCOURSE_URL`,
//! `REDIS_URL`, `PORT`.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.discourse-relay/secrets.toml` (user, must be 0600)
//! 2. `/etc/discourse-relay/secrets.toml` (system, must be 0600)
//!
//! falling back to `DISCOURSE_API_KEY` / `DISCOURSE_API_USERNAME`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{CacheBackend, CacheConfig, store::DEFAULT_MEMORY_MAX_ENTRIES};
use crate::upstream::Credentials;
use crate::{RelayError, Result};

const CONFIG_DIR: &str = ".discourse-relay";
const SYSTEM_DIR: &str = "/etc/discourse-relay";

/// Relay configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// HTTP listener configuration (relayd only).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:3000).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Forum connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamConfig {
    /// Forum base URL, e.g. `https://forum.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// `redis`, `memory` or `none` (default: redis).
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis URL (default: redis://localhost:6379).
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Capacity of the in-process store (default: 10,000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default)]
    pub ttl: TtlSettings,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            max_entries: default_max_entries(),
            ttl: TtlSettings::default(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_max_entries() -> u64 {
    DEFAULT_MEMORY_MAX_ENTRIES
}

/// Per-operation TTLs in seconds. Missing keys keep their defaults; zero is
/// rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtlSettings {
    pub search: u64,
    pub posts: u64,
    pub topic: u64,
    pub category: u64,
    pub advanced_search: u64,
    pub search_category: u64,
    pub search_tags: u64,
}

impl Default for TtlSettings {
    fn default() -> Self {
        let d = CacheConfig::default();
        Self {
            search: d.search.as_secs(),
            posts: d.posts.as_secs(),
            topic: d.topic.as_secs(),
            category: d.category.as_secs(),
            advanced_search: d.advanced_search.as_secs(),
            search_category: d.search_category.as_secs(),
            search_tags: d.search_tags.as_secs(),
        }
    }
}

impl TtlSettings {
    fn entries(&self) -> [(&'static str, u64); 7] {
        [
            ("search", self.search),
            ("posts", self.posts),
            ("topic", self.topic),
            ("category", self.category),
            ("advanced_search", self.advanced_search),
            ("search_category", self.search_category),
            ("search_tags", self.search_tags),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        match self.entries().into_iter().find(|(_, secs)| *secs == 0) {
            Some((op, _)) => Err(RelayError::Configuration(format!(
                "cache TTL for '{op}' must be at least 1 second"
            ))),
            None => Ok(()),
        }
    }

    pub fn to_cache_config(&self) -> Result<CacheConfig> {
        self.validate()?;
        Ok(CacheConfig {
            search: Duration::from_secs(self.search),
            posts: Duration::from_secs(self.posts),
            topic: Duration::from_secs(self.topic),
            category: Duration::from_secs(self.category),
            advanced_search: Duration::from_secs(self.advanced_search),
            search_category: Duration::from_secs(self.search_category),
            search_tags: Duration::from_secs(self.search_tags),
        })
    }
}

/// Secrets configuration (API credentials).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub discourse: Option<DiscourseSecret>,
}

/// Discourse API key and the user it acts as.
#[derive(Clone, Deserialize)]
pub struct DiscourseSecret {
    pub api_key: String,
    pub api_username: String,
}

impl std::fmt::Debug for DiscourseSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscourseSecret")
            .field("api_key", &"<redacted>")
            .field("api_username", &self.api_username)
            .finish()
    }
}

impl Config {
    /// Load configuration from the standard locations and apply
    /// environment overrides.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.discourse-relay/config.toml`
    /// 3. `/etc/discourse-relay/config.toml`
    /// 4. defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a config file without applying overrides.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            RelayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        config.cache.ttl.validate()?;
        Ok(config)
    }

    /// Resolve the config file path; `None` when no file exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(RelayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = Path::new(SYSTEM_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply `DISCOURSE_URL`, `REDIS_URL` and `PORT` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DISCOURSE_URL") {
            self.upstream.base_url = Some(url);
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.cache.redis_url = url;
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|e| RelayError::Configuration(format!("Invalid PORT {port:?}: {e}")))?;
            let host = self
                .server
                .address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or(self.server.address.as_str());
            self.server.address = format!("{host}:{port}");
        }
        Ok(())
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (credentials may come from
    /// env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(CONFIG_DIR).join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = Path::new(SYSTEM_DIR).join("secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            RelayError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            RelayError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(RelayError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Credentials from the secrets file, falling back to the environment.
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// As [`credentials`](Self::credentials), with an explicit env lookup.
    pub fn credentials_with<F>(&self, lookup: F) -> Option<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref secret) = self.discourse {
            return Some(Credentials::new(&secret.api_key, &secret.api_username));
        }
        let api_key = lookup("DISCOURSE_API_KEY")?;
        let api_username = lookup("DISCOURSE_API_USERNAME")?;
        Some(Credentials::new(api_key, api_username))
    }
}
