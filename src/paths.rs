//! Filesystem layout for storewatch.
//!
//! This module defines WHERE data lives. No I/O, no validation.
//!
//! ```text
//! ~/.storewatch/
//! ├── config.toml              # Global config
//! └── data/
//!     └── reviews.db           # SQLite database (reviews, review_counts)
//! ```

use std::path::PathBuf;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "STOREWATCH_CONFIG";

/// User's storewatch home directory: `~/.storewatch/`
pub fn storewatch_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".storewatch")
}

/// Global config file: `~/.storewatch/config.toml`, or `$STOREWATCH_CONFIG`.
pub fn config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => storewatch_home().join("config.toml"),
    }
}

/// Data directory: `~/.storewatch/data/`
pub fn data_dir() -> PathBuf {
    storewatch_home().join("data")
}

/// Default database: `~/.storewatch/data/reviews.db`
pub fn db_path() -> PathBuf {
    data_dir().join("reviews.db")
}
