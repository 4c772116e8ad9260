//! Relay - read-through caching in front of a [`ForumApi`]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::{CacheConfig, ReadThroughCache, derive_key};
use crate::types::{PostsQuery, SearchType};
use crate::{ForumApi, Result};

/// Cached [`ForumApi`] shared by the HTTP and MCP front ends.
///
/// Each operation derives a key from its name and parameters, consults the
/// cache, and only on a miss forwards to the wrapped upstream. With a
/// disabled cache every call goes straight to the upstream.
pub struct Relay {
    upstream: Arc<dyn ForumApi>,
    cache: ReadThroughCache,
    ttl: CacheConfig,
}

impl Relay {
    pub(crate) fn new(upstream: Arc<dyn ForumApi>, cache: ReadThroughCache, ttl: CacheConfig) -> Self {
        Self {
            upstream,
            cache,
            ttl,
        }
    }

    /// Whether responses are being cached.
    pub fn caching_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// TTLs applied per operation.
    pub fn cache_config(&self) -> &CacheConfig {
        &self.ttl
    }
}

#[async_trait]
impl ForumApi for Relay {
    async fn search(&self, query: &str) -> Result<Value> {
        let key = derive_key("search", [("q", query)]);
        self.cache
            .get_or_fetch(&key, self.ttl.search, || self.upstream.search(query))
            .await
    }

    async fn advanced_search(&self, query: &str, search_type: &SearchType) -> Result<Value> {
        let key = derive_key(
            "advanced_search",
            [("q", query), ("type", search_type.as_str())],
        );
        self.cache
            .get_or_fetch(&key, self.ttl.advanced_search, || {
                self.upstream.advanced_search(query, search_type)
            })
            .await
    }

    async fn topic(&self, id: &str) -> Result<Value> {
        let key = derive_key("topic", [("id", id)]);
        self.cache
            .get_or_fetch(&key, self.ttl.topic, || self.upstream.topic(id))
            .await
    }

    async fn category(&self, id: &str) -> Result<Value> {
        let key = derive_key("category", [("id", id)]);
        self.cache
            .get_or_fetch(&key, self.ttl.category, || self.upstream.category(id))
            .await
    }

    async fn posts(&self, params: &PostsQuery) -> Result<Value> {
        let key = derive_key("posts", params);
        self.cache
            .get_or_fetch(&key, self.ttl.posts, || self.upstream.posts(params))
            .await
    }

    async fn search_category(&self, slug: &str, query: &str) -> Result<Value> {
        let key = derive_key("search_category", [("slug", slug), ("q", query)]);
        self.cache
            .get_or_fetch(&key, self.ttl.search_category, || {
                self.upstream.search_category(slug, query)
            })
            .await
    }

    async fn search_tags(&self, tag: &str, query: Option<&str>) -> Result<Value> {
        let query = query.filter(|q| !q.is_empty());
        let mut params = vec![("tag", tag)];
        if let Some(q) = query {
            params.push(("q", q));
        }
        let key = derive_key("search_tags", params);
        self.cache
            .get_or_fetch(&key, self.ttl.search_tags, || {
                self.upstream.search_tags(tag, query)
            })
            .await
    }
}
