//! Core ForumApi trait

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::types::{PostsQuery, SearchType};

/// The forum operations exposed by both front ends.
///
/// Implemented by [`ForumClient`](crate::ForumClient), which calls the forum
/// directly, and by [`Relay`](crate::Relay), which adds read-through caching
/// in front of any other implementation. Front ends hold an
/// `Arc<dyn ForumApi>` and do not know which one they have.
///
/// Payloads are the forum's JSON bodies, passed through untouched.
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// Full-text search.
    async fn search(&self, query: &str) -> Result<Value>;

    /// Search with the query text augmented for `search_type`.
    async fn advanced_search(&self, query: &str, search_type: &SearchType) -> Result<Value>;

    /// Fetch a topic. `id` is forwarded as the raw path segment.
    async fn topic(&self, id: &str) -> Result<Value>;

    /// Fetch a category by id or slug, forwarded as the raw path segment.
    async fn category(&self, id: &str) -> Result<Value>;

    /// List posts, forwarding `params` as query filters.
    async fn posts(&self, params: &PostsQuery) -> Result<Value>;

    /// Search restricted to the category with `slug`.
    async fn search_category(&self, slug: &str, query: &str) -> Result<Value>;

    /// Search posts carrying `tag`, optionally narrowed by `query`.
    async fn search_tags(&self, tag: &str, query: Option<&str>) -> Result<Value>;
}
