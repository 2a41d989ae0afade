use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

pub fn execute(db: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(db)?;
    let path = &config.database.path;

    let repo = super::open_repository(path)?;
    repo.migrate().context("Failed to migrate schema")?;

    info!("DB migration ran");
    println!("✓ Schema up to date: {}", path.display());
    Ok(())
}
