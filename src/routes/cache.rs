use axum::{Json, extract::State, http::StatusCode};

use crate::common::AppState;
use crate::services::cache::CacheStats;

/// Request cache counters
#[utoipa::path(
    get,
    path = "/api/cache/stats",
    responses(
        (status = 200, description = "Entry count and hit/miss counters", body = CacheStats),
    ),
    tag = "cache"
)]
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Drop all cache entries
///
/// The next poll of every cacheable endpoint will hit the backend.
#[utoipa::path(
    post,
    path = "/api/cache/clear",
    responses(
        (status = 204, description = "Cache cleared"),
    ),
    tag = "cache"
)]
pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.cache.clear().await;
    StatusCode::NO_CONTENT
}
