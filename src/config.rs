//! Configuration for storewatch.
//!
//! Read from `~/.storewatch/config.toml` (see [`crate::paths`]). Every
//! section is optional with defaults, so a missing file is a valid setup.
//! A handful of environment variables override the file for CI use.
//!
//! ```toml
//! [database]
//! path = "/var/lib/storewatch/reviews.db"
//!
//! [notify]
//! console = true
//! teams_hook_url = "https://example.webhook.office.com/..."
//!
//! [play_store]
//! program = "gplay-reviews"
//! args = ["--app", "{id}", "--lang", "{lang}", "--count", "{count}"]
//! review_count = 150
//! ```
//!
//! The config value is built once in `main` and passed down explicitly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Overrides `[database] path`.
pub const DB_ENV: &str = "STOREWATCH_DB";
/// Overrides `[notify] teams_hook_url`.
pub const TEAMS_HOOK_ENV: &str = "STOREWATCH_TEAMS_HOOK_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub notify: NotifySection,
    #[serde(default)]
    pub app_store: AppStoreSection,
    #[serde(default)]
    pub play_store: PlayStoreSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    paths::db_path()
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySection {
    /// Print notifications to stdout
    #[serde(default = "default_true")]
    pub console: bool,
    /// Microsoft Teams incoming webhook; unset disables Teams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams_hook_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            console: true,
            teams_hook_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStoreSection {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for AppStoreSection {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// External review-enumeration program for the Play Store.
///
/// `args` may contain `{id}`, `{lang}` and `{count}` placeholders. The
/// program must print a JSON array of reviews on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayStoreSection {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_review_count")]
    pub review_count: usize,
}

fn default_program() -> String {
    "gplay-reviews".to_string()
}
fn default_args() -> Vec<String> {
    ["--app", "{id}", "--lang", "{lang}", "--count", "{count}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_review_count() -> usize {
    150
}

impl Default for PlayStoreSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            review_count: default_review_count(),
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Apply overrides from a variable lookup (normally the process env).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(db) = lookup(DB_ENV) {
            self.database.path = PathBuf::from(db);
        }
        if let Some(hook) = lookup(TEAMS_HOOK_ENV) {
            self.notify.teams_hook_url = Some(hook);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load_from(&dir.path().join("nope.toml"))?;

        assert!(config.notify.console);
        assert!(config.notify.teams_hook_url.is_none());
        assert_eq!(config.play_store.review_count, 150);
        assert_eq!(config.app_store.timeout_secs, 30);
        assert_eq!(config.database.path, paths::db_path());
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[database]
path = "/tmp/reviews.db"

[play_store]
review_count = 40
"#,
        )?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.database.path, PathBuf::from("/tmp/reviews.db"));
        assert_eq!(config.play_store.review_count, 40);
        assert_eq!(config.play_store.program, "gplay-reviews");
        assert!(config.notify.console);
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[database\npath = 3")?;

        assert!(Config::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (DB_ENV, "/data/override.db"),
            (TEAMS_HOOK_ENV, "https://hook.example/abc"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/override.db"));
        assert_eq!(
            config.notify.teams_hook_url.as_deref(),
            Some("https://hook.example/abc")
        );
    }

    #[test]
    fn test_empty_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.database.path, paths::db_path());
        assert!(config.notify.teams_hook_url.is_none());
    }
}
