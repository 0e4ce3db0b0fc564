//! Schema metadata repository.
//!
//! One document per (user, connection), replaced wholesale whenever the
//! schema is re-extracted. Tables are stored as a JSON column.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::engine::metadata::{DatabaseMetadata, TableMetadata};
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone)]
pub struct MetadataRepository {
    pool: SqlitePool,
}

impl MetadataRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the metadata document for a connection. The
    /// original `created_at` survives replacement.
    pub async fn upsert(&self, metadata: &DatabaseMetadata) -> GatewayResult<()> {
        let tables = serde_json::to_string(&metadata.tables)?;

        sqlx::query(
            r#"
            INSERT INTO database_metadata
                (id, user_id, connection_id, db_name, tables, last_updated, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(connection_id) DO UPDATE SET
                db_name = excluded.db_name,
                tables = excluded.tables,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(metadata.user_id.to_string())
        .bind(metadata.connection_id.to_string())
        .bind(&metadata.db_name)
        .bind(tables)
        .bind(metadata.last_updated)
        .bind(metadata.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the metadata document for a connection owned by the user.
    pub async fn get(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
    ) -> GatewayResult<Option<DatabaseMetadata>> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT db_name, tables, last_updated, created_at
            FROM database_metadata
            WHERE user_id = ?1 AND connection_id = ?2
            "#,
        )
        .bind(user_id.to_string())
        .bind(connection_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some((db_name, tables_json, last_updated, created_at)) = row else {
            return Ok(None);
        };

        let tables: Vec<TableMetadata> = serde_json::from_str(&tables_json)
            .map_err(|e| GatewayError::Storage(format!("corrupt metadata document: {}", e)))?;

        Ok(Some(DatabaseMetadata {
            user_id: *user_id,
            connection_id: *connection_id,
            db_name,
            tables,
            last_updated,
            created_at,
        }))
    }

    /// Drop the metadata document for a connection. Returns false when
    /// nothing matched.
    pub async fn delete_for_connection(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
    ) -> GatewayResult<bool> {
        let result = sqlx::query(
            "DELETE FROM database_metadata WHERE user_id = ?1 AND connection_id = ?2",
        )
        .bind(user_id.to_string())
        .bind(connection_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
