//! Meal dataset importer.
//!
//! Upserts every record of a dataset file (a JSON array of raw meal objects)
//! into the meals document store, keyed by `idMeal`. Safe to re-run.
//!
//! Usage:
//! ```bash
//! cargo run --bin import-meals -- --file all_meals.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use meal_prep::config::AppConfig;
use meal_prep::db;
use meal_prep::meals::MealImporter;
use meal_prep::observability;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "import-meals",
    about = "Import the meal dataset into the document store"
)]
struct ImportArgs {
    /// Path to the dataset file
    #[arg(long, default_value = "all_meals.json")]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = ImportArgs::parse();

    let config = AppConfig::from_env()?;
    config.database.validate()?;
    config.cache.validate()?;
    observability::init_logging(&config.observability)?;

    let pool = db::connect_pool(&config.database).await?;
    let importer = MealImporter::connect(&pool, &config.cache).await?;

    let result = importer.import_from_file(&args.file).await;
    pool.close().await;

    let summary = result?;
    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        file = %args.file.display(),
        "Import complete"
    );
    println!(
        "imported {} meals ({} skipped) from {}",
        summary.imported,
        summary.skipped,
        args.file.display()
    );
    Ok(())
}
