//! Imported meal dataset
//!
//! Raw meal records arrive as loosely-typed JSON objects with numbered
//! `strIngredientN` / `strMeasureN` slots. They are decoded once into a
//! [`MealRecord`] and normalized into a [`MealDocument`] before anything
//! touches storage.

pub mod importer;
pub mod index;
pub mod store;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

pub use importer::{ImportSummary, MealImporter};
pub use index::{build_index, write_index, IndexItem, IndexOutcome};
pub use store::{DocumentStore, PgDocumentStore};

/// A raw record as found in the dataset file
pub type RawRecord = serde_json::Map<String, Value>;

/// Number of numbered ingredient/measure slot pairs in a raw record
pub const INGREDIENT_SLOTS: usize = 20;

/// An ingredient name with its free-text measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRef {
    pub name: String,
    pub measure: String,
}

/// A raw record decoded into its known fields
#[derive(Debug, Clone, PartialEq)]
pub struct MealRecord {
    pub id_meal: String,
    pub name: String,
    pub category: String,
    pub area: String,
    pub instructions: String,
    pub thumbnail: String,
    pub youtube: String,
    pub ingredients: Vec<IngredientRef>,
    pub raw: RawRecord,
}

/// The normalized document stored per meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDocument {
    #[serde(rename = "idMeal")]
    pub id_meal: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strCategory")]
    pub category: String,
    #[serde(rename = "strArea")]
    pub area: String,
    #[serde(rename = "strInstructions")]
    pub instructions: String,
    #[serde(rename = "strMealThumb")]
    pub thumbnail: String,
    #[serde(rename = "strYoutube")]
    pub youtube: String,
    pub ingredients: Vec<IngredientRef>,
    /// Every field of the source record, untouched
    pub raw: RawRecord,
}

/// Render a JSON value as the plain string a dataset field stands for
///
/// Missing and `null` become `""`; numbers and booleans use their JSON text.
pub fn value_as_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl MealRecord {
    /// Decode a raw record
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the record has no usable `idMeal`.
    pub fn decode(raw: RawRecord) -> AppResult<Self> {
        let id_meal = value_as_string(raw.get("idMeal")).trim().to_string();
        if id_meal.is_empty() {
            return Err(AppError::Validation("record has no idMeal".to_string()));
        }

        let field = |key: &str| value_as_string(raw.get(key));

        let ingredients = (1..=INGREDIENT_SLOTS)
            .filter_map(|slot| {
                let name = field(&format!("strIngredient{}", slot));
                if name.is_empty() {
                    return None;
                }
                Some(IngredientRef {
                    name,
                    measure: field(&format!("strMeasure{}", slot)),
                })
            })
            .collect();

        Ok(Self {
            name: field("strMeal"),
            category: field("strCategory"),
            area: field("strArea"),
            instructions: field("strInstructions"),
            thumbnail: field("strMealThumb"),
            youtube: field("strYoutube"),
            id_meal,
            ingredients,
            raw,
        })
    }

    /// Normalize into the stored document
    pub fn into_document(self) -> MealDocument {
        MealDocument {
            id_meal: self.id_meal,
            name: self.name,
            category: self.category,
            area: self.area,
            instructions: self.instructions,
            thumbnail: self.thumbnail,
            youtube: self.youtube,
            ingredients: self.ingredients,
            raw: self.raw,
        }
    }
}
