use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::cache::Cache;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Serialize)]
pub struct ReadyResponse<'a> {
    status: &'a str,
    cache: &'a str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Always ready: the cache is optional, so its state is reported, not enforced.
pub async fn readyz(State(cache): State<Cache>) -> impl IntoResponse {
    let cache_state = if cache.is_available().await {
        "available"
    } else {
        "unavailable"
    };
    (
        StatusCode::OK,
        Json(ReadyResponse {
            status: "ready",
            cache: cache_state,
        }),
    )
}
