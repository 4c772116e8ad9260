//! Discourse REST API client.
//!
//! Every request is a GET carrying the `Api-Key` and `Api-Username` headers.
//! See: <https://docs.discourse.org/>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::query;
use crate::traits::ForumApi;
use crate::types::{PostsQuery, SearchType};
use crate::{RelayError, Result, telemetry, version};

/// API credentials sent with every request.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_username: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_username: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_username: api_username.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_username", &self.api_username)
            .finish()
    }
}

/// Uncached client for the forum's REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ForumClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl ForumClient {
    /// Create a client for the forum at `base_url`.
    ///
    /// Requests are anonymous unless [`credentials`](Self::credentials) is
    /// set. No request timeout is applied unless [`timeout`](Self::timeout)
    /// is set.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None, None)
    }

    /// Attach API credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Rebuild the HTTP client with a per-request timeout.
    pub fn timeout(self, timeout: Duration) -> Result<Self> {
        Self::build(self.base_url, self.credentials, Some(timeout))
    }

    fn build(
        base_url: String,
        credentials: Option<Credentials>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(version::user_agent());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// The base URL requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET for `path` with `params` as the query string.
    async fn get_json<Q>(&self, operation: &'static str, path: &str, params: &Q) -> Result<Value>
    where
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let result = self.send(&url, params).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(
            telemetry::UPSTREAM_REQUESTS_TOTAL,
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS, "operation" => operation)
            .record(start.elapsed().as_secs_f64());
        debug!(operation, url = %url, status, "upstream request");

        result
    }

    async fn send<Q>(&self, url: &str, params: &Q) -> Result<Value>
    where
        Q: serde::Serialize + ?Sized,
    {
        let mut request = self.http.get(url).query(params);
        if let Some(ref creds) = self.credentials {
            request = request
                .header("Api-Key", &creds.api_key)
                .header("Api-Username", &creds.api_username);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))?;

        Self::handle_response_errors(&response)?;

        response
            .json()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))
    }

    /// Check response status and map to an upstream error.
    fn handle_response_errors(response: &reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        Err(RelayError::Api {
            status: status.as_u16(),
            message: format!("Request failed with status code {}", status.as_u16()),
        })
    }

    async fn search_text(&self, operation: &'static str, text: &str) -> Result<Value> {
        self.get_json(operation, "/search.json", &[("q", text)]).await
    }
}

/// Accept `raw` as a single URL path segment, unmodified.
///
/// Anything that would end the segment or the path is refused rather than
/// escaped, so the forum sees exactly what the caller sent.
fn path_segment(raw: &str) -> Result<&str> {
    let breaks_path = |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control();
    if raw.is_empty() || raw == "." || raw == ".." || raw.contains(breaks_path) {
        return Err(RelayError::InvalidInput(format!("invalid id '{raw}'")));
    }
    Ok(raw)
}

#[async_trait]
impl ForumApi for ForumClient {
    async fn search(&self, query: &str) -> Result<Value> {
        self.search_text("search", query).await
    }

    async fn advanced_search(&self, query: &str, search_type: &SearchType) -> Result<Value> {
        self.search_text("advanced_search", &query::advanced(query, search_type))
            .await
    }

    async fn topic(&self, id: &str) -> Result<Value> {
        let id = path_segment(id)?;
        self.get_json("topic", &format!("/t/{id}.json"), &[] as &[(&str, &str)])
            .await
    }

    async fn category(&self, id: &str) -> Result<Value> {
        let id = path_segment(id)?;
        self.get_json("category", &format!("/c/{id}.json"), &[] as &[(&str, &str)])
            .await
    }

    async fn posts(&self, params: &PostsQuery) -> Result<Value> {
        self.get_json("posts", "/posts.json", params).await
    }

    async fn search_category(&self, slug: &str, query: &str) -> Result<Value> {
        self.search_text("search_category", &query::in_category(query, slug))
            .await
    }

    async fn search_tags(&self, tag: &str, query: Option<&str>) -> Result<Value> {
        self.search_text("search_tags", &query::with_tag(tag, query))
            .await
    }
}
