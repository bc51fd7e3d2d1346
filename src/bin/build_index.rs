//! Meal search index builder.
//!
//! Reads the meal dataset and writes a compact JSON index (id, name, area,
//! category, thumbnail and ingredient names per meal) for client-side search.
//!
//! Usage:
//! ```bash
//! cargo run --bin build-index -- --file all_meals.json --out public/meals_index.json
//!
//! # Replace an existing index
//! cargo run --bin build-index -- --force
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use meal_prep::meals::{write_index, IndexOutcome};
use meal_prep::observability;
use meal_prep::observability_config::ObservabilityConfig;

#[derive(Parser)]
#[command(
    name = "build-index",
    about = "Build the client-side meal search index"
)]
struct IndexArgs {
    /// Path to the dataset file
    #[arg(long, default_value = "all_meals.json")]
    file: PathBuf,

    /// Output index file
    #[arg(long, default_value = "public/meals_index.json")]
    out: PathBuf,

    /// Overwrite the output if it exists
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = IndexArgs::parse();
    observability::init_logging(&ObservabilityConfig::from_env())?;

    match write_index(&args.file, &args.out, args.force)? {
        IndexOutcome::Written(count) => {
            println!("wrote {} index items to {}", count, args.out.display());
        }
        IndexOutcome::AlreadyExists => {
            println!(
                "index already exists at {}, use --force to overwrite",
                args.out.display()
            );
        }
    }
    Ok(())
}
