use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::observability::{check_database_health, record_health_check_metrics};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness: the database must answer; the meal cache is never required
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let result = check_database_health(&state.pool).await;
    record_health_check_metrics("readiness", result.is_ok(), start.elapsed());

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "cache": state.importer.cache_enabled(),
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": "database unavailable" })),
            )
        }
    }
}
