//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! The `Database` from `moda-db` holds a `SqlitePool` and a broadcast
//! change feed, both thread-safe, so commands can run queries concurrently
//! without explicit locking.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_products(db: &DbState) -> ApiResult<Vec<Product>> {
//!     Ok(db.inner().products().list().await?)
//! }
//! ```

use moda_db::{Database, DbConfig};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{AppConfig, ConfigError};

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens the database named by the configuration, creating its
    /// directory if needed.
    pub async fn open(config: &AppConfig) -> ApiResult<Self> {
        let path = config.database_path()?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ConfigError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        debug!(path = %path.display(), "Opening database");

        let db = Database::new(DbConfig::new(path)).await?;
        Ok(DbState::new(db))
    }

    /// Private in-memory database (tests and dry runs).
    pub async fn in_memory() -> ApiResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(DbState::new(db))
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
