use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use splunked_api::{build_router, AppState};
use splunked_common::Config;
use splunked_store::{db, MappingStore, TrainingStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("splunked=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    splunked_store::init(&pool, &config.mappings_seed_path, &config.pipelines_seed_path).await?;
    info!("Database ready");

    let state = Arc::new(AppState::new(
        MappingStore::new(pool.clone()),
        TrainingStore::new(pool),
    ));
    let app = build_router(state);

    let addr = config.bind_addr();
    info!("SPLUNKed server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
