//! discourse-relay - caching proxy for the Discourse forum API
//!
//! This crate exposes a fixed set of read-only forum operations (search,
//! topics, categories, posts and a few search refinements) through the
//! [`ForumApi`] trait. [`ForumClient`] talks to the forum directly;
//! [`Relay`] wraps any implementation with a read-through cache whose keys
//! are derived deterministically from the operation and its parameters.
//!
//! Two front ends sit on top of the same [`Relay`]:
//!
//! - `relayd`, an HTTP proxy (feature `server`)
//! - `relay-mcp`, a JSON-RPC tool server over stdio (feature `mcp`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use discourse_relay::{ForumApi, Relay, cache::MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> discourse_relay::Result<()> {
//!     let relay = Relay::builder()
//!         .base_url("https://forum.example.com")
//!         .credentials("api-key", "system")
//!         .store(Arc::new(MemoryStore::new()))
//!         .build()?;
//!
//!     let topic = relay.topic("42").await?;
//!     println!("{}", topic["title"]);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
#[cfg(feature = "server")]
pub mod http;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod upstream;
pub mod version;

// Re-export main types at crate root
pub use error::{RelayError, Result};
pub use gateway::{Relay, RelayBuilder};
pub use traits::ForumApi;
pub use types::{PostsQuery, SearchType};
pub use upstream::{Credentials, ForumClient};
pub use version::{BuildInfo, PKG_VERSION, user_agent, version_string};
