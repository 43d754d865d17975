//! SQLite Persistence
//!
//! Local storage for the console: admin accounts and the key-value settings
//! store (which carries the persisted profile cache). The engine remains the
//! single source of truth for all relevance rules; nothing here mirrors them.

pub mod accounts;
pub mod migrations;
pub mod settings;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Handle to the console database. Cheap to clone; all clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at the given path and bring
    /// the schema up to date.
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;
        info!(path = %path.display(), "database ready");
        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection, because every
    /// SQLite memory connection gets its own private store.
    pub async fn open_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        migrations::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
