use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use anyhow::{Context, Result};
use meal_prep::config::AppConfig;
use meal_prep::db;
use meal_prep::errors::error_logging;
use meal_prep::meals::MealImporter;
use meal_prep::observability;
use meal_prep::routes::{self, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let startup = Instant::now();

    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "environment", "startup_validation");
        return Err(e.into());
    }

    // The primary store is mandatory; failing to reach it ends startup here
    let pool = db::connect_pool(&config.database).await?;

    observability::init_observability_with_health_checks(
        Some(pool.clone()),
        config.observability.clone(),
    )
    .await?;
    info!("{}", config.summary());

    db::init_database_schema(&pool).await?;
    let importer = MealImporter::connect(&pool, &config.cache).await?;

    let _health_metrics_handle = observability::start_health_metrics_recorder(pool.clone());

    let app = routes::router(AppState::new(pool.clone(), importer));
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.server.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;

    observability::record_startup_metrics(startup.elapsed());
    info!(address = %addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down, closing database pool");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
