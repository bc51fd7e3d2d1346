use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{deleted, found, invalid, json_body, path_id, AppState};
use crate::db::{self, MeasuredIngredient, NewRecipe, Recipe};
use crate::errors::AppResult;
use crate::validation::{validate_entity_name, validate_recipe_numbers, validate_recipe_title};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/import", post(import_recipe))
        .route("/recipes/:id", get(get_recipe).delete(delete_recipe))
}

/// Body of `POST /v1/recipes/import`
#[derive(Debug, Deserialize)]
pub struct ImportRecipeRequest {
    #[serde(flatten)]
    pub recipe: NewRecipe,
    #[serde(default)]
    pub ingredients: Vec<MeasuredIngredient>,
}

fn validated(mut recipe: NewRecipe) -> AppResult<NewRecipe> {
    recipe.title = validate_recipe_title(&recipe.title)
        .map_err(invalid)?
        .to_string();
    validate_recipe_numbers(recipe.servings, recipe.prep_time, recipe.cook_time)
        .map_err(invalid)?;
    Ok(recipe)
}

async fn list_recipes(State(state): State<AppState>) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(db::list_recipes(&state.pool).await?))
}

async fn create_recipe(
    State(state): State<AppState>,
    payload: Result<Json<NewRecipe>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let recipe = validated(json_body(payload)?)?;
    let created = db::create_recipe(&state.pool, &recipe).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Recipe>> {
    let id = path_id(&id)?;
    Ok(Json(found(db::read_recipe(&state.pool, id).await?)?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = path_id(&id)?;
    deleted(db::delete_recipe(&state.pool, id).await?)?;
    Ok(Json(json!({ "status": "deleted", "recipeId": id })))
}

async fn import_recipe(
    State(state): State<AppState>,
    payload: Result<Json<ImportRecipeRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request = json_body(payload)?;
    let recipe = validated(request.recipe)?;

    let mut ingredients = Vec::with_capacity(request.ingredients.len());
    for ingredient in request.ingredients {
        let name = validate_entity_name(&ingredient.name).map_err(invalid)?;
        ingredients.push(MeasuredIngredient {
            name: name.to_string(),
            measure: ingredient.measure,
        });
    }

    let recipe_id = db::import_recipe_with_ingredients(&state.pool, &recipe, &ingredients).await?;
    Ok((StatusCode::CREATED, Json(json!({ "recipe_id": recipe_id }))))
}
