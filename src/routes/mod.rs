//! HTTP API
//!
//! Every handler lives in a per-resource module exposing `routes()`; this
//! module assembles them under `/v1`, adds request tracing and metrics, and
//! holds the helpers shared by all handlers.

pub mod health;
pub mod ingredients;
pub mod meal_plans;
pub mod meals;
pub mod recipes;

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Json, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::meals::MealImporter;
use crate::observability::record_request_metrics;
use crate::validation::parse_id;

/// Handles shared by every request
#[derive(Clone, Debug)]
pub struct AppState {
    pub pool: PgPool,
    pub importer: MealImporter,
}

impl AppState {
    pub fn new(pool: PgPool, importer: MealImporter) -> Self {
        Self { pool, importer }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(recipes::routes())
        .merge(ingredients::routes())
        .merge(meal_plans::routes())
        .merge(meals::routes());

    Router::new()
        .merge(health::routes())
        .nest("/v1", v1)
        .route_layer(middleware::from_fn(track_request_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn track_request_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(req).await;

    record_request_metrics(&method, &route, response.status().as_u16(), start.elapsed());
    response
}

/// Turn a static validation message into a 400 error
pub(crate) fn invalid(message: &'static str) -> AppError {
    AppError::Validation(message.to_string())
}

/// Parse a positive integer path id
pub(crate) fn path_id(raw: &str) -> AppResult<i64> {
    parse_id(raw).map_err(invalid)
}

/// Unwrap a JSON body, reporting any rejection as `invalid body`
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected request body");
            Err(invalid("invalid body"))
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("not found".to_string())
}

/// Map an optional row to 404 when absent
pub(crate) fn found<T>(value: Option<T>) -> AppResult<T> {
    value.ok_or_else(not_found)
}

/// Map a delete result to 404 when nothing was removed
pub(crate) fn deleted(removed: bool) -> AppResult<()> {
    if removed {
        Ok(())
    } else {
        Err(not_found())
    }
}
