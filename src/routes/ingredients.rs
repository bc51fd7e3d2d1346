use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::{deleted, found, invalid, json_body, path_id, AppState};
use crate::db::{self, Ingredient, IngredientPatch, NewIngredient};
use crate::errors::{AppError, AppResult};
use crate::validation::validate_entity_name;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recipes/:id/ingredients",
            get(list_ingredients).post(create_ingredient),
        )
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

async fn list_ingredients(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<Json<Vec<Ingredient>>> {
    let recipe_id = path_id(&recipe_id)?;
    Ok(Json(
        db::list_ingredients_for_recipe(&state.pool, recipe_id).await?,
    ))
}

async fn create_ingredient(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    payload: Result<Json<NewIngredient>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Ingredient>)> {
    let recipe_id = path_id(&recipe_id)?;
    if !db::recipe_exists(&state.pool, recipe_id).await? {
        return Err(AppError::NotFound("recipe not found".to_string()));
    }

    let mut ingredient = json_body(payload)?;
    ingredient.name = validate_entity_name(&ingredient.name)
        .map_err(invalid)?
        .to_string();

    let created = db::create_ingredient(&state.pool, recipe_id, &ingredient).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Ingredient>> {
    let id = path_id(&id)?;
    Ok(Json(found(db::read_ingredient(&state.pool, id).await?)?))
}

async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<IngredientPatch>, JsonRejection>,
) -> AppResult<Json<Ingredient>> {
    let id = path_id(&id)?;
    let mut patch = json_body(payload)?;
    if let Some(name) = patch.name.as_deref() {
        patch.name = Some(validate_entity_name(name).map_err(invalid)?.to_string());
    }

    Ok(Json(found(
        db::update_ingredient(&state.pool, id, &patch).await?,
    )?))
}

async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = path_id(&id)?;
    deleted(db::delete_ingredient(&state.pool, id).await?)?;
    Ok(StatusCode::NO_CONTENT)
}
