//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Metrics collection and Prometheus export
//! - Distributed tracing with OpenTelemetry
//! - Structured logging with configurable levels
//! - Health check endpoints for monitoring
//! - Environment-specific configuration support

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;
use sqlx::PgPool;

use crate::observability_config::ObservabilityConfig;

pub use health_checks::{check_database_health, start_health_metrics_recorder};
pub use metrics::{
    record_cache_lookup, record_cache_populate_failure, record_db_metrics, record_error_metrics,
    record_health_check_metrics, record_import_metrics, record_request_metrics,
    record_startup_metrics,
};
pub use tracing_mod::{db_span, import_span};

/// Initialize logging only
///
/// Used by the command-line tools, which have no metrics listener.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;
    tracing_mod::init_tracing_with_config(config)
}

/// Initialize the complete observability stack with health check dependencies
///
/// Installs the tracing subscriber, the Prometheus recorder, optional OTLP export,
/// and starts the metrics/health listener on `config.metrics_port`.
pub async fn init_observability_with_health_checks(
    db_pool: Option<PgPool>,
    config: ObservabilityConfig,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Logging first, with span export when an OTLP endpoint is configured
    tracing_mod::init_tracing_with_otlp(&config).await?;

    let metrics_handle = metrics::init_metrics_with_config(&config)?;

    if config.enable_metrics_export {
        metrics::start_metrics_server_with_health_checks(
            metrics_handle,
            config.metrics_port,
            db_pool.clone(),
        )
        .await?;
    }

    tracing::info!(
        environment = %config.environment,
        has_db_pool = %db_pool.is_some(),
        metrics_port = %config.metrics_port,
        "Observability stack with health checks initialized successfully"
    );
    Ok(())
}
