//! Compact search index over the meal dataset

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{MealRecord, RawRecord};
use crate::errors::{error_logging, AppError, AppResult};

/// One searchable meal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexItem {
    #[serde(rename = "idMeal")]
    pub id_meal: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strArea")]
    pub area: String,
    #[serde(rename = "strCategory", default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(rename = "strMealThumb", default, skip_serializing_if = "String::is_empty")]
    pub thumbnail: String,
    pub ingredients: Vec<String>,
}

impl From<MealRecord> for IndexItem {
    fn from(record: MealRecord) -> Self {
        Self {
            id_meal: record.id_meal,
            name: record.name,
            area: record.area,
            category: record.category,
            thumbnail: record.thumbnail,
            ingredients: record.ingredients.into_iter().map(|i| i.name).collect(),
        }
    }
}

/// Result of [`write_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The index was written with this many items
    Written(usize),
    /// The output already existed and `force` was not set
    AlreadyExists,
}

/// Build index items, dropping records without an `idMeal`
pub fn build_index(records: Vec<RawRecord>) -> Vec<IndexItem> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(position, raw)| match MealRecord::decode(raw) {
            Ok(record) => Some(IndexItem::from(record)),
            Err(e) => {
                warn!(position, error = %e, "Leaving record out of index");
                None
            }
        })
        .collect()
}

/// Read the dataset at `input` and write a pretty-printed index to `output`
///
/// Refuses to replace an existing output unless `force` is set.
pub fn write_index(input: &Path, output: &Path, force: bool) -> AppResult<IndexOutcome> {
    if !force && output.exists() {
        return Ok(IndexOutcome::AlreadyExists);
    }

    let bytes = fs::read(input).map_err(|e| {
        error_logging::log_filesystem_error(&e, "read_dataset", input.to_str());
        AppError::FileSystem(format!("failed to read {}: {}", input.display(), e))
    })?;
    let records: Vec<RawRecord> = serde_json::from_slice(&bytes)?;

    let items = build_index(records);
    let rendered = serde_json::to_vec_pretty(&items)
        .map_err(|e| AppError::Internal(format!("failed to render index: {}", e)))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, rendered).map_err(|e| {
        error_logging::log_filesystem_error(&e, "write_index", output.to_str());
        AppError::FileSystem(format!("failed to write {}: {}", output.display(), e))
    })?;

    info!(items = items.len(), output = %output.display(), "Meal index written");
    Ok(IndexOutcome::Written(items.len()))
}
