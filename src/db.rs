use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::observability::record_db_metrics;
use crate::text_processing::parse_measure;

/// Represents a recipe in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a recipe
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub youtube_link: Option<String>,
    pub servings: Option<i32>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
}

/// Represents an ingredient attached to a recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Fields accepted when adding an ingredient
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

/// Partial ingredient update; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

/// An ingredient line with a free-text measure, as sent by the bulk import
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeasuredIngredient {
    pub name: String,
    #[serde(default)]
    pub measure: String,
}

/// Represents a meal plan spanning a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPlan {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Represents a recipe scheduled inside a meal plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPlanRecipe {
    pub id: i64,
    pub meal_plan_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<NaiveDate>,
}

/// Validated values for a new or updated meal plan entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealPlanEntry {
    pub recipe_id: Option<i64>,
    pub meal_type: Option<String>,
    pub planned_date: Option<NaiveDate>,
}

const RECIPE_COLUMNS: &str = "id, title, description, instructions, youtube_link, servings, prep_time, cook_time, created_at, updated_at";
const INGREDIENT_COLUMNS: &str = "id, recipe_id, name, quantity, unit";
const MEAL_PLAN_COLUMNS: &str = "id, name, start_date, end_date, created_at";
const MEAL_PLAN_RECIPE_COLUMNS: &str = "id, meal_plan_id, recipe_id, meal_type, planned_date";

fn recipe_from_row(row: &PgRow) -> sqlx::Result<Recipe> {
    Ok(Recipe {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        instructions: row.try_get("instructions")?,
        youtube_link: row.try_get("youtube_link")?,
        servings: row.try_get("servings")?,
        prep_time: row.try_get("prep_time")?,
        cook_time: row.try_get("cook_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ingredient_from_row(row: &PgRow) -> sqlx::Result<Ingredient> {
    Ok(Ingredient {
        id: row.try_get("id")?,
        recipe_id: row.try_get("recipe_id")?,
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        unit: row.try_get("unit")?,
    })
}

fn meal_plan_from_row(row: &PgRow) -> sqlx::Result<MealPlan> {
    Ok(MealPlan {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn meal_plan_recipe_from_row(row: &PgRow) -> sqlx::Result<MealPlanRecipe> {
    Ok(MealPlanRecipe {
        id: row.try_get("id")?,
        meal_plan_id: row.try_get("meal_plan_id")?,
        recipe_id: row.try_get("recipe_id")?,
        meal_type: row.try_get("meal_type")?,
        planned_date: row.try_get("planned_date")?,
    })
}

/// Open a connection pool and verify the database answers
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .max_lifetime(config.max_lifetime_secs.map(Duration::from_secs))
        .idle_timeout(config.idle_timeout_secs.map(Duration::from_secs))
        .connect(&config.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        max_connections = config.max_connections,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            instructions TEXT,
            youtube_link TEXT,
            servings INTEGER,
            prep_time INTEGER,
            cook_time INTEGER,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id BIGSERIAL PRIMARY KEY,
            recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            name VARCHAR(255) NOT NULL,
            quantity TEXT,
            unit TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipe_ingredients table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meal_plans (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (end_date >= start_date)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plans table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meal_plan_recipes (
            id BIGSERIAL PRIMARY KEY,
            meal_plan_id BIGINT NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            recipe_id BIGINT REFERENCES recipes(id) ON DELETE SET NULL,
            meal_type VARCHAR(20) CHECK (meal_type IN ('breakfast', 'lunch', 'dinner', 'snack')),
            planned_date DATE
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plan_recipes table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS recipe_ingredients_recipe_id_idx ON recipe_ingredients(recipe_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create recipe_ingredients recipe_id index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS meal_plan_recipes_meal_plan_id_idx ON meal_plan_recipes(meal_plan_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plan_recipes meal_plan_id index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// List the most recent recipes, newest first
pub async fn list_recipes(pool: &PgPool) -> Result<Vec<Recipe>> {
    let start = Instant::now();

    let rows = sqlx::query(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC, id DESC LIMIT 100"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list recipes")?;

    let recipes = rows
        .iter()
        .map(recipe_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .context("Failed to decode recipe rows")?;

    record_db_metrics("list_recipes", start.elapsed());
    Ok(recipes)
}

/// Create a new recipe and return the stored row
pub async fn create_recipe(pool: &PgPool, recipe: &NewRecipe) -> Result<Recipe> {
    debug!(title = %recipe.title, "Creating new recipe");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "INSERT INTO recipes (title, description, instructions, youtube_link, servings, prep_time, cook_time)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.instructions)
    .bind(&recipe.youtube_link)
    .bind(recipe.servings)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .fetch_one(pool)
    .await
    .context("Failed to insert new recipe")?;

    let created = recipe_from_row(&row).context("Failed to decode created recipe")?;
    record_db_metrics("insert_recipe", start.elapsed());
    debug!(recipe_id = %created.id, "Recipe created successfully");

    Ok(created)
}

/// Read a recipe from the database by ID
pub async fn read_recipe(pool: &PgPool, recipe_id: i64) -> Result<Option<Recipe>> {
    debug!(recipe_id = %recipe_id, "Reading recipe");
    let start = Instant::now();

    let row = sqlx::query(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"))
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read recipe")?;

    record_db_metrics("select_recipe", start.elapsed());
    row.as_ref()
        .map(recipe_from_row)
        .transpose()
        .context("Failed to decode recipe row")
}

/// Check whether a recipe exists
pub async fn recipe_exists(pool: &PgPool, recipe_id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1)")
        .bind(recipe_id)
        .fetch_one(pool)
        .await
        .context("Failed to check recipe existence")?;
    Ok(exists)
}

/// Delete a recipe and, by cascade, its ingredients
pub async fn delete_recipe(pool: &PgPool, recipe_id: i64) -> Result<bool> {
    debug!(recipe_id = %recipe_id, "Deleting recipe");
    let start = Instant::now();

    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await
        .context("Failed to delete recipe")?;

    record_db_metrics("delete_recipe", start.elapsed());
    let rows_affected = result.rows_affected();
    if rows_affected > 0 {
        debug!(recipe_id = %recipe_id, "Recipe deleted successfully");
        Ok(true)
    } else {
        info!("No recipe found with ID: {recipe_id}");
        Ok(false)
    }
}

/// Insert a recipe and its ingredients in one transaction
///
/// Each measure is split into quantity and unit. Any failure rolls the whole
/// import back.
pub async fn import_recipe_with_ingredients(
    pool: &PgPool,
    recipe: &NewRecipe,
    ingredients: &[MeasuredIngredient],
) -> Result<i64> {
    let start = Instant::now();
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin recipe import transaction")?;

    let recipe_id: i64 = sqlx::query_scalar(
        "INSERT INTO recipes (title, description, instructions, youtube_link, servings, prep_time, cook_time)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.instructions)
    .bind(&recipe.youtube_link)
    .bind(recipe.servings)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to insert imported recipe")?;

    for ingredient in ingredients {
        let parsed = parse_measure(&ingredient.measure);
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit) VALUES ($1, $2, $3, $4)",
        )
        .bind(recipe_id)
        .bind(&ingredient.name)
        .bind(&parsed.quantity)
        .bind(&parsed.unit)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert imported ingredient '{}'", ingredient.name))?;
    }

    tx.commit()
        .await
        .context("Failed to commit recipe import transaction")?;

    record_db_metrics("import_recipe", start.elapsed());
    info!(
        recipe_id = %recipe_id,
        ingredient_count = ingredients.len(),
        "Recipe imported with ingredients"
    );
    Ok(recipe_id)
}

/// List the ingredients of a recipe in insertion order
pub async fn list_ingredients_for_recipe(pool: &PgPool, recipe_id: i64) -> Result<Vec<Ingredient>> {
    let start = Instant::now();

    let rows = sqlx::query(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY id ASC"
    ))
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .context("Failed to list ingredients for recipe")?;

    record_db_metrics("list_ingredients", start.elapsed());
    rows.iter()
        .map(ingredient_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .context("Failed to decode ingredient rows")
}

/// Create a new ingredient for a recipe
pub async fn create_ingredient(
    pool: &PgPool,
    recipe_id: i64,
    ingredient: &NewIngredient,
) -> Result<Ingredient> {
    debug!(recipe_id = %recipe_id, name = %ingredient.name, "Creating new ingredient");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit)
         VALUES ($1, $2, $3, $4)
         RETURNING {INGREDIENT_COLUMNS}"
    ))
    .bind(recipe_id)
    .bind(&ingredient.name)
    .bind(&ingredient.quantity)
    .bind(&ingredient.unit)
    .fetch_one(pool)
    .await
    .context("Failed to insert new ingredient")?;

    record_db_metrics("insert_ingredient", start.elapsed());
    ingredient_from_row(&row).context("Failed to decode created ingredient")
}

/// Read an ingredient from the database by ID
pub async fn read_ingredient(pool: &PgPool, ingredient_id: i64) -> Result<Option<Ingredient>> {
    debug!(ingredient_id = %ingredient_id, "Reading ingredient");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM recipe_ingredients WHERE id = $1"
    ))
    .bind(ingredient_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read ingredient")?;

    record_db_metrics("select_ingredient", start.elapsed());
    row.as_ref()
        .map(ingredient_from_row)
        .transpose()
        .context("Failed to decode ingredient row")
}

/// Apply a partial update to an ingredient
///
/// Returns `None` when the ingredient does not exist.
pub async fn update_ingredient(
    pool: &PgPool,
    ingredient_id: i64,
    patch: &IngredientPatch,
) -> Result<Option<Ingredient>> {
    debug!(ingredient_id = %ingredient_id, "Updating ingredient");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "UPDATE recipe_ingredients
         SET name = COALESCE($1, name), quantity = COALESCE($2, quantity), unit = COALESCE($3, unit)
         WHERE id = $4
         RETURNING {INGREDIENT_COLUMNS}"
    ))
    .bind(&patch.name)
    .bind(&patch.quantity)
    .bind(&patch.unit)
    .bind(ingredient_id)
    .fetch_optional(pool)
    .await
    .context("Failed to update ingredient")?;

    record_db_metrics("update_ingredient", start.elapsed());
    row.as_ref()
        .map(ingredient_from_row)
        .transpose()
        .context("Failed to decode updated ingredient")
}

/// Delete an ingredient from the database
pub async fn delete_ingredient(pool: &PgPool, ingredient_id: i64) -> Result<bool> {
    debug!(ingredient_id = %ingredient_id, "Deleting ingredient");

    let result = sqlx::query("DELETE FROM recipe_ingredients WHERE id = $1")
        .bind(ingredient_id)
        .execute(pool)
        .await
        .context("Failed to delete ingredient")?;

    Ok(result.rows_affected() > 0)
}

/// List every meal plan by start date
pub async fn list_meal_plans(pool: &PgPool) -> Result<Vec<MealPlan>> {
    let start = Instant::now();

    let rows = sqlx::query(&format!(
        "SELECT {MEAL_PLAN_COLUMNS} FROM meal_plans ORDER BY start_date ASC, id ASC"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list meal plans")?;

    record_db_metrics("list_meal_plans", start.elapsed());
    rows.iter()
        .map(meal_plan_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .context("Failed to decode meal plan rows")
}

/// Create a meal plan
pub async fn create_meal_plan(
    pool: &PgPool,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<MealPlan> {
    debug!(name = %name, "Creating meal plan");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "INSERT INTO meal_plans (name, start_date, end_date) VALUES ($1, $2, $3)
         RETURNING {MEAL_PLAN_COLUMNS}"
    ))
    .bind(name)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
    .context("Failed to insert meal plan")?;

    record_db_metrics("insert_meal_plan", start.elapsed());
    meal_plan_from_row(&row).context("Failed to decode created meal plan")
}

/// Read a meal plan by ID
pub async fn read_meal_plan(pool: &PgPool, meal_plan_id: i64) -> Result<Option<MealPlan>> {
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "SELECT {MEAL_PLAN_COLUMNS} FROM meal_plans WHERE id = $1"
    ))
    .bind(meal_plan_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read meal plan")?;

    record_db_metrics("select_meal_plan", start.elapsed());
    row.as_ref()
        .map(meal_plan_from_row)
        .transpose()
        .context("Failed to decode meal plan row")
}

/// Overwrite name and dates of an existing meal plan
pub async fn update_meal_plan(pool: &PgPool, plan: &MealPlan) -> Result<Option<MealPlan>> {
    debug!(meal_plan_id = %plan.id, "Updating meal plan");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "UPDATE meal_plans SET name = $1, start_date = $2, end_date = $3 WHERE id = $4
         RETURNING {MEAL_PLAN_COLUMNS}"
    ))
    .bind(&plan.name)
    .bind(plan.start_date)
    .bind(plan.end_date)
    .bind(plan.id)
    .fetch_optional(pool)
    .await
    .context("Failed to update meal plan")?;

    record_db_metrics("update_meal_plan", start.elapsed());
    row.as_ref()
        .map(meal_plan_from_row)
        .transpose()
        .context("Failed to decode updated meal plan")
}

/// Delete a meal plan and, by cascade, its entries
pub async fn delete_meal_plan(pool: &PgPool, meal_plan_id: i64) -> Result<bool> {
    debug!(meal_plan_id = %meal_plan_id, "Deleting meal plan");

    let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1")
        .bind(meal_plan_id)
        .execute(pool)
        .await
        .context("Failed to delete meal plan")?;

    Ok(result.rows_affected() > 0)
}

/// Check whether a meal plan exists
pub async fn meal_plan_exists(pool: &PgPool, meal_plan_id: i64) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM meal_plans WHERE id = $1)")
            .bind(meal_plan_id)
            .fetch_one(pool)
            .await
            .context("Failed to check meal plan existence")?;
    Ok(exists)
}

/// List the entries of a meal plan by planned date
pub async fn list_meal_plan_recipes(
    pool: &PgPool,
    meal_plan_id: i64,
) -> Result<Vec<MealPlanRecipe>> {
    let start = Instant::now();

    let rows = sqlx::query(&format!(
        "SELECT {MEAL_PLAN_RECIPE_COLUMNS} FROM meal_plan_recipes
         WHERE meal_plan_id = $1
         ORDER BY planned_date ASC, id ASC"
    ))
    .bind(meal_plan_id)
    .fetch_all(pool)
    .await
    .context("Failed to list meal plan recipes")?;

    record_db_metrics("list_meal_plan_recipes", start.elapsed());
    rows.iter()
        .map(meal_plan_recipe_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .context("Failed to decode meal plan recipe rows")
}

/// Schedule a recipe inside a meal plan
pub async fn create_meal_plan_recipe(
    pool: &PgPool,
    meal_plan_id: i64,
    entry: &MealPlanEntry,
) -> Result<MealPlanRecipe> {
    debug!(meal_plan_id = %meal_plan_id, recipe_id = ?entry.recipe_id, "Adding recipe to meal plan");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "INSERT INTO meal_plan_recipes (meal_plan_id, recipe_id, meal_type, planned_date)
         VALUES ($1, $2, $3, $4)
         RETURNING {MEAL_PLAN_RECIPE_COLUMNS}"
    ))
    .bind(meal_plan_id)
    .bind(entry.recipe_id)
    .bind(&entry.meal_type)
    .bind(entry.planned_date)
    .fetch_one(pool)
    .await
    .context("Failed to insert meal plan recipe")?;

    record_db_metrics("insert_meal_plan_recipe", start.elapsed());
    meal_plan_recipe_from_row(&row).context("Failed to decode created meal plan recipe")
}

/// Read a meal plan entry by ID
pub async fn read_meal_plan_recipe(pool: &PgPool, entry_id: i64) -> Result<Option<MealPlanRecipe>> {
    let row = sqlx::query(&format!(
        "SELECT {MEAL_PLAN_RECIPE_COLUMNS} FROM meal_plan_recipes WHERE id = $1"
    ))
    .bind(entry_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read meal plan recipe")?;

    row.as_ref()
        .map(meal_plan_recipe_from_row)
        .transpose()
        .context("Failed to decode meal plan recipe row")
}

/// Apply a partial update to a meal plan entry
///
/// `None` fields keep their stored value.
pub async fn update_meal_plan_recipe(
    pool: &PgPool,
    entry_id: i64,
    patch: &MealPlanEntry,
) -> Result<Option<MealPlanRecipe>> {
    debug!(entry_id = %entry_id, "Updating meal plan recipe");
    let start = Instant::now();

    let row = sqlx::query(&format!(
        "UPDATE meal_plan_recipes
         SET recipe_id = COALESCE($1, recipe_id),
             meal_type = COALESCE($2, meal_type),
             planned_date = COALESCE($3, planned_date)
         WHERE id = $4
         RETURNING {MEAL_PLAN_RECIPE_COLUMNS}"
    ))
    .bind(patch.recipe_id)
    .bind(&patch.meal_type)
    .bind(patch.planned_date)
    .bind(entry_id)
    .fetch_optional(pool)
    .await
    .context("Failed to update meal plan recipe")?;

    record_db_metrics("update_meal_plan_recipe", start.elapsed());
    row.as_ref()
        .map(meal_plan_recipe_from_row)
        .transpose()
        .context("Failed to decode updated meal plan recipe")
}

/// Delete a meal plan entry
pub async fn delete_meal_plan_recipe(pool: &PgPool, entry_id: i64) -> Result<bool> {
    debug!(entry_id = %entry_id, "Deleting meal plan recipe");

    let result = sqlx::query("DELETE FROM meal_plan_recipes WHERE id = $1")
        .bind(entry_id)
        .execute(pool)
        .await
        .context("Failed to delete meal plan recipe")?;

    Ok(result.rows_affected() > 0)
}
