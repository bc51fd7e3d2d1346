use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{found, invalid, json_body, AppState};
use crate::errors::AppResult;
use crate::meals::{ImportSummary, MealDocument, RawRecord};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals/import", post(import_meals))
        .route("/meals/:id", get(get_meal))
}

/// Look a meal up by `idMeal`, through the cache when one is configured
async fn get_meal(
    State(state): State<AppState>,
    Path(id_meal): Path<String>,
) -> AppResult<Json<MealDocument>> {
    let id_meal = id_meal.trim();
    if id_meal.is_empty() {
        return Err(invalid("invalid id"));
    }
    Ok(Json(found(state.importer.get(id_meal).await?)?))
}

async fn import_meals(
    State(state): State<AppState>,
    payload: Result<Json<Vec<RawRecord>>, JsonRejection>,
) -> AppResult<Json<ImportSummary>> {
    let records = json_body(payload)?;
    Ok(Json(state.importer.import(records).await?))
}
