//! Bulk import of users and parent contacts from a CSV roster.

mod config;
mod import;
mod pin;
mod reconcile;
mod row;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::DbConfig;

/// Bulk import users and parent contacts from a CSV file.
#[derive(Parser)]
#[command(name = "roster-import", version, about)]
struct Cli {
    /// Path to the CSV file
    csv_path: PathBuf,

    /// Validate and reconcile without committing changes
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let config = DbConfig::from_env()?;
    let pool = config.connect().await?;

    let summary = import::run_import(&pool, &cli.csv_path, cli.dry_run).await?;
    pool.close().await;

    println!("\n{}", summary);
    Ok(())
}
