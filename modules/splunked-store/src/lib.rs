//! SQLite persistence for the mapping catalog and training content.

pub mod content;
pub mod db;
pub mod mappings;
pub mod training;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use splunked_common::{Catalog, MappingSet};

pub use content::ContentError;
pub use mappings::MappingStore;
pub use training::TrainingStore;

/// Read-only source of the composer's catalog snapshot.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All five mapping lists, each ordered and free of duplicate ids.
    async fn get_all_mappings(&self) -> Result<MappingSet>;

    async fn catalog(&self) -> Result<Catalog> {
        Ok(self.get_all_mappings().await?.into())
    }
}

/// Run migrations and seed empty tables.
pub async fn init(pool: &SqlitePool, mappings_seed: &Path, pipelines_seed: &Path) -> Result<()> {
    db::migrate(pool).await?;
    MappingStore::new(pool.clone())
        .seed_if_empty(mappings_seed)
        .await?;
    TrainingStore::new(pool.clone())
        .seed_pipelines_if_empty(pipelines_seed)
        .await?;
    Ok(())
}
