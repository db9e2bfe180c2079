use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Target-side configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the target forum database
    pub database_url: String,
    /// Root directory for migrated binaries (avatars/, files/)
    pub assets_dir: PathBuf,
    /// Public URL prefix the target forum serves assets under
    pub base_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            assets_dir: env::var("ASSETS_DIR")
                .unwrap_or_else(|_| "assets".to_string())
                .into(),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
        })
    }
}
