//! Primary document store for imported meals

use std::time::Instant;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, Instrument};

use super::MealDocument;
use crate::errors::AppResult;
use crate::observability::{db_span, record_db_metrics};

/// Authoritative storage for meal documents, keyed by `idMeal`
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or fully replace the document stored under its `idMeal`
    async fn upsert(&self, document: &MealDocument) -> AppResult<()>;

    /// Fetch a document; `None` when no such meal exists
    async fn find(&self, id_meal: &str) -> AppResult<Option<MealDocument>>;
}

/// PostgreSQL document store keeping each meal as a JSONB row
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the meals table if it does not exist yet
    pub async fn init_schema(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS meals (
                id_meal TEXT PRIMARY KEY,
                document JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;

        debug!("Meals table ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn upsert(&self, document: &MealDocument) -> AppResult<()> {
        let start = Instant::now();

        sqlx::query(
            "INSERT INTO meals (id_meal, document, updated_at) VALUES ($1, $2, NOW())
             ON CONFLICT (id_meal) DO UPDATE
             SET document = EXCLUDED.document, updated_at = NOW()",
        )
        .bind(&document.id_meal)
        .bind(Json(document))
        .execute(&self.pool)
        .instrument(db_span("upsert_meal", "meals"))
        .await?;

        record_db_metrics("upsert_meal", start.elapsed());
        Ok(())
    }

    async fn find(&self, id_meal: &str) -> AppResult<Option<MealDocument>> {
        let start = Instant::now();

        let row: Option<Json<MealDocument>> =
            sqlx::query_scalar("SELECT document FROM meals WHERE id_meal = $1")
                .bind(id_meal)
                .fetch_optional(&self.pool)
                .instrument(db_span("find_meal", "meals"))
                .await?;

        record_db_metrics("find_meal", start.elapsed());
        Ok(row.map(|Json(document)| document))
    }
}
