pub mod migrate;
pub mod scrape;
pub mod status;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use storewatch::config::Config;
use storewatch::repository::ReviewsRepository;

/// Load config, letting `--db` win over file and environment.
pub fn load_config(db: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(db) = db {
        config.database.path = db;
    }
    Ok(config)
}

/// Open the configured database, creating its directory on first use.
pub fn open_repository(path: &Path) -> Result<ReviewsRepository> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }
    ReviewsRepository::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))
}
