//! Health check functionality module.
//!
//! This module provides:
//! - Database connectivity checks
//! - Readiness checks for the metrics listener and the HTTP API

use anyhow::Result;
use sqlx::PgPool;

/// Perform readiness checks against the configured dependencies
///
/// The meal cache is optional infrastructure and is never part of readiness.
pub async fn perform_readiness_checks(db_pool: Option<&PgPool>) -> Result<()> {
    if let Some(pool) = db_pool {
        check_database_health(pool).await?;
    }
    Ok(())
}

/// Check database connectivity and basic query capability
pub async fn check_database_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;

    tracing::debug!("Database health check passed");
    Ok(())
}

/// Start a background task to periodically record health check metrics
pub fn start_health_metrics_recorder(db_pool: PgPool) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60)); // Every minute

        loop {
            interval.tick().await;

            let check_start = std::time::Instant::now();
            let db_healthy = check_database_health(&db_pool).await.is_ok();
            crate::observability::metrics::record_health_check_metrics(
                "database",
                db_healthy,
                check_start.elapsed(),
            );
        }
    })
}
