//! Unified SQLite storage for the gateway.
//!
//! One database file holds connection records, extracted schema metadata,
//! and the query history log. Repositories share a single pool.

mod connections;
mod history;
mod metadata;
mod types;

pub use connections::ConnectionsRepository;
pub use history::HistoryRepository;
pub use metadata::MetadataRepository;
pub use types::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// Shared gateway storage backed by SQLite.
#[derive(Debug, Clone)]
pub struct GatewayStore {
    pool: SqlitePool,
}

impl GatewayStore {
    /// Open (or create) the database at the configured path.
    pub async fn open(config: &GatewayConfig) -> GatewayResult<Self> {
        Self::from_path(&config.db_path).await
    }

    async fn from_path(db_path: &Path) -> GatewayResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GatewayError::Storage(e.to_string()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Open an in-memory database. Used by tests.
    pub async fn in_memory() -> GatewayResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A second connection would see a different empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Get a connections repository
    pub fn connections(&self) -> ConnectionsRepository {
        ConnectionsRepository::new(self.pool.clone())
    }

    /// Get a metadata repository
    pub fn metadata(&self) -> MetadataRepository {
        MetadataRepository::new(self.pool.clone())
    }

    /// Get a query history repository
    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }

    /// Initialize the database schema
    async fn initialize_schema(&self) -> GatewayResult<()> {
        sqlx::query(
            r#"
                CREATE TABLE IF NOT EXISTS connections (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    encrypted_payload TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'disconnected',
                    last_connected_at TIMESTAMP,
                    created_at TIMESTAMP NOT NULL,
                    updated_at TIMESTAMP NOT NULL
                )
                "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_connections_user ON connections(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
                CREATE TABLE IF NOT EXISTS database_metadata (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    connection_id TEXT NOT NULL UNIQUE,
                    db_name TEXT NOT NULL,
                    tables TEXT NOT NULL,
                    last_updated TIMESTAMP NOT NULL,
                    created_at TIMESTAMP NOT NULL
                )
                "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_metadata_user ON database_metadata(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
                CREATE TABLE IF NOT EXISTS query_history (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    query TEXT NOT NULL,
                    status TEXT NOT NULL,
                    db_name TEXT NOT NULL,
                    error TEXT,
                    response_metadata TEXT,
                    response_time_ms INTEGER NOT NULL,
                    rows INTEGER NOT NULL DEFAULT 0,
                    affected_rows INTEGER NOT NULL DEFAULT 0,
                    timestamp TIMESTAMP NOT NULL
                )
                "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_user ON query_history(user_id, timestamp DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initializes_on_fresh_database() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            // Listing against empty tables proves they exist.
            let user = uuid::Uuid::new_v4();
            assert!(store.connections().list(&user).await.unwrap().is_empty());
            assert!(store.history().list(&user).await.unwrap().is_empty());
        });
    }

    #[test]
    fn open_creates_parent_directories() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db_path = dir.path().join("nested").join("gateway.db");
            let config = GatewayConfig::new("salt", db_path.clone());
            let _store = GatewayStore::open(&config).await.unwrap();
            assert!(db_path.exists());
        });
    }
}
