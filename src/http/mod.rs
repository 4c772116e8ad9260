//! HTTP proxy surface.
//!
//! One route per forum operation. Every response is JSON; any failure,
//! upstream or validation, is answered with HTTP 500 and
//! `{ "error": "<message>" }` so existing clients of the proxy keep working.
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `GET /search.json?q=` | [`ForumApi::search`] |
//! | `GET /posts.json?<filters>` | [`ForumApi::posts`] |
//! | `GET /topics/:id` | [`ForumApi::topic`] |
//! | `GET /categories/:id` | [`ForumApi::category`] |
//! | `GET /search/advanced?q=&type=` | [`ForumApi::advanced_search`] |
//! | `GET /search/category/:slug?q=` | [`ForumApi::search_category`] |
//! | `GET /search/tags/:tag?q=` | [`ForumApi::search_tags`] |

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::types::{PostsQuery, SearchType};
use crate::{ForumApi, RelayError};

type SharedApi = Arc<dyn ForumApi>;

/// Build the router serving `api`.
pub fn router(api: SharedApi) -> Router {
    Router::new()
        .route("/search.json", get(search))
        .route("/posts.json", get(posts))
        .route("/topics/:id", get(topic))
        .route("/categories/:id", get(category))
        .route("/search/advanced", get(advanced_search))
        .route("/search/category/:slug", get(search_category))
        .route("/search/tags/:tag", get(search_tags))
        .layer(TraceLayer::new_for_http())
        .with_state(api)
}

/// Error body written for any failed request.
pub struct ApiError(RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

type ApiResult = std::result::Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    search_type: Option<String>,
}

impl SearchParams {
    fn required_query(&self) -> Result<&str, RelayError> {
        self.q.as_deref().ok_or_else(|| RelayError::missing("q"))
    }
}

async fn search(State(api): State<SharedApi>, Query(params): Query<SearchParams>) -> ApiResult {
    let q = params.required_query()?;
    Ok(Json(api.search(q).await?))
}

async fn posts(State(api): State<SharedApi>, Query(params): Query<PostsQuery>) -> ApiResult {
    Ok(Json(api.posts(&params).await?))
}

async fn topic(State(api): State<SharedApi>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(api.topic(&id).await?))
}

async fn category(State(api): State<SharedApi>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(api.category(&id).await?))
}

async fn advanced_search(
    State(api): State<SharedApi>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let q = params.required_query()?;
    let search_type = SearchType::from(params.search_type.as_deref());
    Ok(Json(api.advanced_search(q, &search_type).await?))
}

async fn search_category(
    State(api): State<SharedApi>,
    Path(slug): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let q = params.required_query()?;
    Ok(Json(api.search_category(&slug, q).await?))
}

async fn search_tags(
    State(api): State<SharedApi>,
    Path(tag): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    Ok(Json(api.search_tags(&tag, params.q.as_deref()).await?))
}
