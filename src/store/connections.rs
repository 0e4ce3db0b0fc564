//! Connection record repository.
//!
//! Every operation is scoped by `user_id`; a record is invisible to any
//! other user even when its id is known.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{ConnectionRecord, ConnectionStatus};
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone)]
pub struct ConnectionsRepository {
    pool: SqlitePool,
}

type ConnectionTuple = (
    String,
    String,
    String,
    String,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn from_tuple(row: ConnectionTuple) -> GatewayResult<ConnectionRecord> {
    let (id, user_id, encrypted_payload, status, last_connected_at, created_at, updated_at) = row;
    Ok(ConnectionRecord {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        encrypted_payload,
        status: ConnectionStatus::from_db_str(&status),
        last_connected_at,
        created_at,
        updated_at,
    })
}

fn parse_uuid(s: &str) -> GatewayResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| GatewayError::Storage(format!("invalid uuid in store: {}", e)))
}

impl ConnectionsRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new connection record.
    pub async fn create(&self, record: &ConnectionRecord) -> GatewayResult<()> {
        sqlx::query(
            r#"
            INSERT INTO connections
                (id, user_id, encrypted_payload, status, last_connected_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.encrypted_payload)
        .bind(record.status.to_db_str())
        .bind(record.last_connected_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch one connection owned by the user.
    pub async fn get(&self, user_id: &Uuid, id: &Uuid) -> GatewayResult<Option<ConnectionRecord>> {
        let row = sqlx::query_as::<_, ConnectionTuple>(
            r#"
            SELECT id, user_id, encrypted_payload, status, last_connected_at, created_at, updated_at
            FROM connections
            WHERE user_id = ?1 AND id = ?2
            "#,
        )
        .bind(user_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(from_tuple).transpose()
    }

    /// All connections owned by the user, oldest first.
    pub async fn list(&self, user_id: &Uuid) -> GatewayResult<Vec<ConnectionRecord>> {
        let rows = sqlx::query_as::<_, ConnectionTuple>(
            r#"
            SELECT id, user_id, encrypted_payload, status, last_connected_at, created_at, updated_at
            FROM connections
            WHERE user_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(from_tuple).collect()
    }

    /// Replace the ciphertext for a connection. Returns false when the
    /// record does not exist for this user.
    pub async fn update_payload(
        &self,
        user_id: &Uuid,
        id: &Uuid,
        encrypted_payload: &str,
    ) -> GatewayResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE connections
            SET encrypted_payload = ?1, updated_at = ?2
            WHERE user_id = ?3 AND id = ?4
            "#,
        )
        .bind(encrypted_payload)
        .bind(Utc::now())
        .bind(user_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a connection to a new lifecycle state. Entering `Connected`
    /// also stamps `last_connected_at`.
    pub async fn update_status(
        &self,
        user_id: &Uuid,
        id: &Uuid,
        status: ConnectionStatus,
    ) -> GatewayResult<bool> {
        let now = Utc::now();
        let last_connected_at = (status == ConnectionStatus::Connected).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE connections
            SET status = ?1,
                last_connected_at = COALESCE(?2, last_connected_at),
                updated_at = ?3
            WHERE user_id = ?4 AND id = ?5
            "#,
        )
        .bind(status.to_db_str())
        .bind(last_connected_at)
        .bind(now)
        .bind(user_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a connection. Returns false when nothing matched.
    pub async fn delete(&self, user_id: &Uuid, id: &Uuid) -> GatewayResult<bool> {
        let result = sqlx::query("DELETE FROM connections WHERE user_id = ?1 AND id = ?2")
            .bind(user_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
