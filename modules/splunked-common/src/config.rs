use std::env;
use std::path::PathBuf;

use crate::error::SplunkedError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Seed files applied to empty tables at startup
    pub mappings_seed_path: PathBuf,
    pub pipelines_seed_path: PathBuf,
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/splunked.db?mode=rwc";

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    /// Every value has a default; only a malformed port is an error.
    pub fn from_env() -> Result<Self, SplunkedError> {
        dotenvy::dotenv().ok();

        let web_port = env::var("WEB_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| SplunkedError::Config("WEB_PORT must be a number".to_string()))?;

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port,
            mappings_seed_path: env::var("MAPPINGS_SEED_PATH")
                .unwrap_or_else(|_| "data/prompt-builder-mappings.json".to_string())
                .into(),
            pipelines_seed_path: env::var("PIPELINES_SEED_PATH")
                .unwrap_or_else(|_| "data/training-pipelines.json".to_string())
                .into(),
        };

        tracing::info!(
            database_url = %config.database_url,
            host = %config.web_host,
            port = config.web_port,
            "Config loaded"
        );
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }
}
