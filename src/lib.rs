//! # Meal Prep
//!
//! A meal-planning REST backend: recipes, ingredients and meal plans in
//! PostgreSQL, plus an imported meal dataset served through an optional
//! read-through cache.

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod meals;
pub mod observability;
pub mod observability_config;
pub mod routes;
pub mod text_processing;
pub mod validation;

// Re-export types for easier access
pub use meals::{MealDocument, MealImporter};
pub use text_processing::{parse_measure, MeasureParser, ParsedMeasure};
