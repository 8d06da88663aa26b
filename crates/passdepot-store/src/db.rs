//! Store database connection and initialization.

use std::path::Path;

use passdepot_core::config::{StoreConfig, default_database_path};
use passdepot_core::db::{DatabaseError, open_pool, open_pool_in_memory};
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Handle to the store's SQLite pool. Cheap to clone; repositories and
/// services hold their own copies.
#[derive(Clone)]
pub struct StoreDatabase {
    pool: Pool<Sqlite>,
}

impl StoreDatabase {
    /// Open or create a store database at the given path.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        let pool = open_pool(path, 5, 5).await?;
        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Open the database described by a [`StoreConfig`], resolving the
    /// per-OS default location when no path is configured.
    pub async fn open_with_config(config: &StoreConfig) -> Result<Self, DatabaseError> {
        let path = match &config.database_path {
            Some(path) => path.clone(),
            None => default_database_path().ok_or_else(|| {
                DatabaseError::Connection("No database path configured and no default available".to_string())
            })?,
        };

        let pool = open_pool(&path, config.max_connections, config.busy_timeout_secs).await?;
        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let pool = open_pool_in_memory().await?;
        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Store migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
