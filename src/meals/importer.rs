//! Cache-aside meal importer
//!
//! Writes go straight to the document store; reads check the optional cache
//! first and populate it from the store on a miss.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info, warn, Instrument};

use super::{MealDocument, MealRecord, RawRecord};
use crate::cache::{connect_cache, meal_cache_key, ReadThroughCache};
use crate::config::CacheConfig;
use crate::errors::{error_logging, AppError, AppResult};
use crate::meals::store::{DocumentStore, PgDocumentStore};
use crate::observability::{import_span, record_import_metrics};

/// Outcome of an import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records upserted into the document store
    pub imported: usize,
    /// Records dropped for lacking an `idMeal`
    pub skipped: usize,
}

/// Imports the meal dataset and serves point lookups through the cache
#[derive(Clone)]
pub struct MealImporter {
    store: Arc<dyn DocumentStore>,
    cache: ReadThroughCache,
}

impl std::fmt::Debug for MealImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealImporter")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl MealImporter {
    pub fn new(store: Arc<dyn DocumentStore>, cache: ReadThroughCache) -> Self {
        Self { store, cache }
    }

    /// Build the production importer on top of an open Postgres pool
    ///
    /// # Errors
    ///
    /// Fails when the document store cannot be prepared. An unreachable cache
    /// is only logged and leaves the importer running without one.
    pub async fn connect(pool: &PgPool, cache_config: &CacheConfig) -> AppResult<Self> {
        let store = PgDocumentStore::new(pool.clone());
        store.init_schema().await?;

        let cache = connect_cache(cache_config).await;
        info!(cache_enabled = cache.is_enabled(), "Meal importer ready");

        Ok(Self::new(Arc::new(store), cache))
    }

    /// Whether reads go through a cache
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Upsert every record by `idMeal`
    ///
    /// Records without an `idMeal` are skipped. The first storage failure
    /// stops the run; records upserted before it stay in place.
    pub async fn import(&self, records: Vec<RawRecord>) -> AppResult<ImportSummary> {
        let span = import_span("request", records.len());
        self.run_import(records).instrument(span).await
    }

    /// Read a JSON array of raw records from `path` and import it
    pub async fn import_from_file(&self, path: &Path) -> AppResult<ImportSummary> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            error_logging::log_filesystem_error(&e, "read_dataset", path.to_str());
            AppError::FileSystem(format!("failed to read {}: {}", path.display(), e))
        })?;

        let records: Vec<RawRecord> = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), records = records.len(), "Loaded meal dataset");

        let span = import_span(&path.display().to_string(), records.len());
        self.run_import(records).instrument(span).await
    }

    async fn run_import(&self, records: Vec<RawRecord>) -> AppResult<ImportSummary> {
        let start = Instant::now();
        let mut summary = ImportSummary::default();

        for (position, raw) in records.into_iter().enumerate() {
            let record = match MealRecord::decode(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(position, error = %e, "Skipping meal record");
                    summary.skipped += 1;
                    continue;
                }
            };

            let document = record.into_document();
            if let Err(e) = self.store.upsert(&document).await {
                error_logging::log_import_error(&e, &document.id_meal, summary.imported);
                record_import_metrics(summary.imported, summary.skipped, true, start.elapsed());
                return Err(AppError::Import {
                    id_meal: document.id_meal,
                    message: e.to_string(),
                });
            }
            summary.imported += 1;
        }

        record_import_metrics(summary.imported, summary.skipped, false, start.elapsed());
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            duration_ms = start.elapsed().as_millis() as u64,
            "Meal import finished"
        );
        Ok(summary)
    }

    /// Fetch a meal by `idMeal`
    ///
    /// Cache hits never touch the store. Only store failures are errors; an
    /// unknown meal is `Ok(None)`.
    pub async fn get(&self, id_meal: &str) -> AppResult<Option<MealDocument>> {
        let key = meal_cache_key(id_meal);

        if let Some(bytes) = self.cache.lookup(&key).await {
            match serde_json::from_slice::<MealDocument>(&bytes) {
                Ok(document) => return Ok(Some(document)),
                Err(e) => debug!(key = %key, error = %e, "Undecodable cache entry, reading store"),
            }
        }

        let Some(document) = self.store.find(id_meal).await? else {
            return Ok(None);
        };

        if self.cache.is_enabled() {
            match serde_json::to_vec(&document) {
                Ok(bytes) => self.cache.populate(&key, bytes).await,
                Err(e) => debug!(key = %key, error = %e, "Could not serialize meal for cache"),
            }
        }

        Ok(Some(document))
    }
}
