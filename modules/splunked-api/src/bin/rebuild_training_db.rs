//! Rebuild the training tables from content files and pipeline definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use splunked_common::Config;
use splunked_store::{content, db, TrainingStore};

#[derive(Parser)]
#[command(name = "rebuild-training-db", about = "Rebuild training database.")]
struct Cli {
    /// Path to training content directory
    #[arg(long, default_value = "content/training")]
    content_dir: PathBuf,

    /// Path to pipeline definition JSON
    #[arg(long, default_value = "data/training-pipelines.json")]
    pipelines: PathBuf,

    /// Clear existing training data before importing
    #[arg(long)]
    reset: bool,

    /// Database URL (defaults to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = match cli.database_url {
        Some(url) => url,
        None => Config::from_env()?.database_url,
    };

    let pool = db::connect(&database_url).await?;
    db::migrate(&pool).await?;
    let store = TrainingStore::new(pool);

    if cli.reset {
        store.reset().await?;
        info!("Cleared existing training data");
    }

    let mut modules = 0;
    if cli.content_dir.exists() {
        let records = content::load_modules(&cli.content_dir).with_context(|| {
            format!("Failed to load content from {}", cli.content_dir.display())
        })?;
        for record in &records {
            if store.upsert_module(record).await?.is_some() {
                modules += 1;
            }
        }
    }

    let pipelines = content::load_pipelines(&cli.pipelines)
        .with_context(|| format!("Failed to load pipelines from {}", cli.pipelines.display()))?;
    for pipeline in &pipelines {
        store.upsert_pipeline(pipeline).await?;
    }

    info!(modules, pipelines = pipelines.len(), "Training database rebuild complete");
    Ok(())
}
