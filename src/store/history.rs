//! Query history repository. Append-only.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{HistoryStatus, QueryHistoryRecord};
use crate::engine::envelope::ExecutionMetadata;
use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

type HistoryTuple = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
    i64,
    i64,
    DateTime<Utc>,
);

impl HistoryRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one record to the log.
    pub async fn record(&self, entry: &QueryHistoryRecord) -> GatewayResult<()> {
        let response_metadata = entry
            .response_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO query_history
                (id, user_id, query, status, db_name, error, response_metadata,
                 response_time_ms, rows, affected_rows, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.query)
        .bind(entry.status.to_db_str())
        .bind(&entry.db_name)
        .bind(&entry.error)
        .bind(response_metadata)
        .bind(entry.response_time_ms)
        .bind(entry.rows)
        .bind(entry.affected_rows)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All records for a user, newest first.
    pub async fn list(&self, user_id: &Uuid) -> GatewayResult<Vec<QueryHistoryRecord>> {
        let rows = sqlx::query_as::<_, HistoryTuple>(
            r#"
            SELECT id, user_id, query, status, db_name, error, response_metadata,
                   response_time_ms, rows, affected_rows, timestamp
            FROM query_history
            WHERE user_id = ?1
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let (
                    id,
                    user_id,
                    query,
                    status,
                    db_name,
                    error,
                    response_metadata,
                    response_time_ms,
                    record_rows,
                    affected_rows,
                    timestamp,
                ) = row;

                let response_metadata: Option<ExecutionMetadata> = response_metadata
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()
                    .map_err(|e| GatewayError::Storage(format!("corrupt history entry: {}", e)))?;

                Ok(QueryHistoryRecord {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| GatewayError::Storage(format!("invalid uuid in store: {}", e)))?,
                    user_id: Uuid::parse_str(&user_id)
                        .map_err(|e| GatewayError::Storage(format!("invalid uuid in store: {}", e)))?,
                    query,
                    status: HistoryStatus::from_db_str(&status),
                    db_name,
                    error,
                    response_metadata,
                    response_time_ms,
                    rows: record_rows,
                    affected_rows,
                    timestamp,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GatewayStore;

    #[test]
    fn records_come_back_newest_first() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let repo = store.history();
            let user = Uuid::new_v4();

            let mut first = QueryHistoryRecord::failure(user, "SELECT 1", "shop", "boom");
            first.timestamp = Utc::now() - chrono::Duration::seconds(10);
            repo.record(&first).await.unwrap();

            let metadata = ExecutionMetadata {
                row_count: 1,
                execution_time_ms: 5,
                affected_rows: 0,
                columns: vec!["?column?".to_string()],
            };
            let second = QueryHistoryRecord::success(user, "SELECT 1", "shop", &metadata);
            repo.record(&second).await.unwrap();

            let listed = repo.list(&user).await.unwrap();
            assert_eq!(listed.len(), 2);
            assert_eq!(listed[0].status, HistoryStatus::Success);
            assert_eq!(listed[1].status, HistoryStatus::Failed);
            assert_eq!(
                listed[0].response_metadata.as_ref().map(|m| m.row_count),
                Some(1)
            );
        });
    }

    #[test]
    fn history_is_scoped_to_its_user() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let repo = store.history();
            let user = Uuid::new_v4();

            repo.record(&QueryHistoryRecord::failure(user, "SELECT 1", "shop", "boom"))
                .await
                .unwrap();

            assert!(repo.list(&Uuid::new_v4()).await.unwrap().is_empty());
            assert_eq!(repo.list(&user).await.unwrap().len(), 1);
        });
    }
}
