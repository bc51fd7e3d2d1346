use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{deleted, found, invalid, json_body, path_id, AppState};
use crate::db::{self, MealPlan, MealPlanEntry, MealPlanRecipe};
use crate::errors::{AppError, AppResult};
use crate::validation::{parse_date, validate_date_range, validate_entity_name, validate_meal_type};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_meal_plans).post(create_meal_plan))
        .route(
            "/meal-plans/:id",
            get(get_meal_plan)
                .put(update_meal_plan)
                .delete(delete_meal_plan),
        )
        .route(
            "/meal-plans/:id/recipes",
            get(list_meal_plan_recipes).post(create_meal_plan_recipe),
        )
        .route(
            "/meal-plan-recipes/:id",
            get(get_meal_plan_recipe)
                .put(update_meal_plan_recipe)
                .delete(delete_meal_plan_recipe),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateMealPlanRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealPlanRequest {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMealPlanRecipeRequest {
    pub recipe_id: i64,
    pub meal_type: Option<String>,
    pub planned_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealPlanRecipeRequest {
    pub recipe_id: Option<i64>,
    pub meal_type: Option<String>,
    pub planned_date: Option<String>,
}

fn date(raw: &str) -> AppResult<NaiveDate> {
    parse_date(raw).map_err(invalid)
}

fn optional_date(raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    raw.map(date).transpose()
}

fn optional_meal_type(raw: Option<&str>) -> AppResult<Option<String>> {
    raw.map(|meal_type| validate_meal_type(meal_type).map_err(invalid))
        .transpose()
}

/// Reject non-positive ids and ids of recipes that do not exist
async fn ensure_recipe(state: &AppState, recipe_id: i64) -> AppResult<()> {
    if recipe_id <= 0 {
        return Err(invalid("invalid recipe_id"));
    }
    if !db::recipe_exists(&state.pool, recipe_id).await? {
        return Err(AppError::NotFound("recipe not found".to_string()));
    }
    Ok(())
}

async fn list_meal_plans(State(state): State<AppState>) -> AppResult<Json<Vec<MealPlan>>> {
    Ok(Json(db::list_meal_plans(&state.pool).await?))
}

async fn create_meal_plan(
    State(state): State<AppState>,
    payload: Result<Json<CreateMealPlanRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MealPlan>)> {
    let request = json_body(payload)?;
    let name = validate_entity_name(&request.name).map_err(invalid)?;
    let start_date = date(&request.start_date)?;
    let end_date = date(&request.end_date)?;
    validate_date_range(start_date, end_date).map_err(invalid)?;

    let plan = db::create_meal_plan(&state.pool, name, start_date, end_date).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_meal_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MealPlan>> {
    let id = path_id(&id)?;
    Ok(Json(found(db::read_meal_plan(&state.pool, id).await?)?))
}

async fn update_meal_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMealPlanRequest>, JsonRejection>,
) -> AppResult<Json<MealPlan>> {
    let id = path_id(&id)?;
    let patch = json_body(payload)?;

    let mut plan = found(db::read_meal_plan(&state.pool, id).await?)?;
    if let Some(name) = patch.name.as_deref() {
        plan.name = validate_entity_name(name).map_err(invalid)?.to_string();
    }
    if let Some(start_date) = optional_date(patch.start_date.as_deref())? {
        plan.start_date = start_date;
    }
    if let Some(end_date) = optional_date(patch.end_date.as_deref())? {
        plan.end_date = end_date;
    }
    validate_date_range(plan.start_date, plan.end_date).map_err(invalid)?;

    Ok(Json(found(db::update_meal_plan(&state.pool, &plan).await?)?))
}

async fn delete_meal_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = path_id(&id)?;
    deleted(db::delete_meal_plan(&state.pool, id).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_meal_plan_recipes(
    State(state): State<AppState>,
    Path(meal_plan_id): Path<String>,
) -> AppResult<Json<Vec<MealPlanRecipe>>> {
    let meal_plan_id = path_id(&meal_plan_id)?;
    Ok(Json(
        db::list_meal_plan_recipes(&state.pool, meal_plan_id).await?,
    ))
}

async fn create_meal_plan_recipe(
    State(state): State<AppState>,
    Path(meal_plan_id): Path<String>,
    payload: Result<Json<CreateMealPlanRecipeRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MealPlanRecipe>)> {
    let meal_plan_id = path_id(&meal_plan_id)?;
    if !db::meal_plan_exists(&state.pool, meal_plan_id).await? {
        return Err(AppError::NotFound("meal plan not found".to_string()));
    }

    let request = json_body(payload)?;
    let entry = MealPlanEntry {
        recipe_id: Some(request.recipe_id),
        meal_type: optional_meal_type(request.meal_type.as_deref())?,
        planned_date: optional_date(request.planned_date.as_deref())?,
    };
    ensure_recipe(&state, request.recipe_id).await?;

    let created = db::create_meal_plan_recipe(&state.pool, meal_plan_id, &entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_meal_plan_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MealPlanRecipe>> {
    let id = path_id(&id)?;
    Ok(Json(found(
        db::read_meal_plan_recipe(&state.pool, id).await?,
    )?))
}

async fn update_meal_plan_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMealPlanRecipeRequest>, JsonRejection>,
) -> AppResult<Json<MealPlanRecipe>> {
    let id = path_id(&id)?;
    let request = json_body(payload)?;

    let patch = MealPlanEntry {
        recipe_id: request.recipe_id,
        meal_type: optional_meal_type(request.meal_type.as_deref())?,
        planned_date: optional_date(request.planned_date.as_deref())?,
    };
    if let Some(recipe_id) = patch.recipe_id {
        ensure_recipe(&state, recipe_id).await?;
    }

    Ok(Json(found(
        db::update_meal_plan_recipe(&state.pool, id, &patch).await?,
    )?))
}

async fn delete_meal_plan_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = path_id(&id)?;
    deleted(db::delete_meal_plan_recipe(&state.pool, id).await?)?;
    Ok(StatusCode::NO_CONTENT)
}
