//! # Configuration
//!
//! Application configuration loaded once at startup.
//!
//! ## Configuration Sources (later wins)
//! 1. Defaults (this file)
//! 2. Config file: `--config FILE`, else `moda.toml` in the platform
//!    config directory when it exists
//! 3. Environment variables (`MODA_*`)
//!
//! ```toml
//! store_name = "Boutique Bela"
//! db_path = "/srv/moda/moda.db"
//! backup_dir = "/srv/moda/backups"
//! import_concurrency = 5
//! import_timeout_ms = 5000
//! ```
//!
//! ## Thread Safety
//! Read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::batch::BatchOptions;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "moda.toml";

/// Database file name inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "moda.db";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Store name shown in the header and the backup summary.
    pub store_name: String,

    /// Database file; platform data dir when unset.
    pub db_path: Option<PathBuf>,

    /// Where `moda backup` writes files; current directory when unset.
    pub backup_dir: Option<PathBuf>,

    /// Catalog import writes in flight at once.
    pub import_concurrency: usize,

    /// Per-write timeout during catalog import.
    pub import_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store_name: "ModaGestão".to_string(),
            db_path: None,
            backup_dir: None,
            import_concurrency: 5,
            import_timeout_ms: 5_000,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file, then the process environment,
    /// and validates the result.
    ///
    /// An `explicit` file must exist; the default `moda.toml` is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => {
                info!(path = %path.display(), "Loading config file");
                AppConfig::from_file(path)?
            }
            None => match config_file_path() {
                Some(path) if path.exists() => {
                    info!(path = %path.display(), "Loading config file");
                    AppConfig::from_file(&path)?
                }
                _ => {
                    debug!("No config file, using defaults");
                    AppConfig::default()
                }
            },
        };

        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        AppConfig::from_toml_str(&text)
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `MODA_*` overrides from the given variables.
    ///
    /// ## Environment Variables
    /// - `MODA_DB_PATH`
    /// - `MODA_STORE_NAME`
    /// - `MODA_BACKUP_DIR`
    /// - `MODA_IMPORT_CONCURRENCY`
    /// - `MODA_IMPORT_TIMEOUT_MS`
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "MODA_DB_PATH" => self.db_path = Some(PathBuf::from(value)),
                "MODA_STORE_NAME" => self.store_name = value,
                "MODA_BACKUP_DIR" => self.backup_dir = Some(PathBuf::from(value)),
                "MODA_IMPORT_CONCURRENCY" => {
                    self.import_concurrency = parse_number(&key, &value)?;
                }
                "MODA_IMPORT_TIMEOUT_MS" => {
                    self.import_timeout_ms = parse_number(&key, &value)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "import_concurrency".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.import_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "import_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolves the database file. The directory is created on open.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/br.modagestao.moda/moda.db`
    /// - **Windows**: `%APPDATA%\modagestao\moda\data\moda.db`
    /// - **Linux**: `~/.local/share/moda/moda.db`
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
        Ok(dirs.data_dir().join(DATABASE_FILE_NAME))
    }

    /// Directory for exported backups.
    pub fn backup_directory(&self) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Batch settings for catalog import.
    pub fn import_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.import_concurrency,
            item_timeout: Duration::from_millis(self.import_timeout_ms),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("br", "modagestao", "moda")
}

/// Location of `moda.toml`, if the platform has a config directory.
pub fn config_file_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        field: key.to_string(),
        reason: format!("'{}' is not a number", value),
    })
}
