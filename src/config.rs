//! Runtime configuration resolved from the environment.
//!
//! Shared by the CLI and TUI front ends.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable naming the database file.
pub const DB_ENV: &str = "LORE_DB";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "LORE_LOG";

/// Where the database lives and how loudly to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_filter: Option<String>,
}

impl Config {
    /// Resolves configuration from `LORE_DB` and `LORE_LOG`.
    ///
    /// An explicit `database` path, such as the `--db` flag, beats `LORE_DB`;
    /// without either the platform default from [`default_database_path`] is
    /// used. Empty variables count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the default path is needed and the data directory
    /// cannot be determined.
    pub fn from_env(database: Option<PathBuf>) -> Result<Self> {
        let database_path = match database.or_else(|| env_value(DB_ENV).map(PathBuf::from)) {
            Some(path) => path,
            None => default_database_path()?,
        };

        Ok(Self {
            database_path,
            log_filter: env_value(LOG_ENV),
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/lore/lore.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn default_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("lore").join("lore.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}
