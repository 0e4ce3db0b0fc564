//! MySQL metadata extractor.
//!
//! Tables and columns come from `information_schema`, scoped to the
//! current database via `DATABASE()`. The `COLUMN_KEY` field drives the
//! key flags: `PRI` names the table's primary key, `UNI` marks a unique
//! column, and any other non-empty value (`MUL`) marks an indexed column.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row as _};

use super::open_pool;
use crate::engine::metadata::{ColumnMetadata, TableMetadata};
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::SchemaExtractor;
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

pub struct MySqlExtractor {
    timeouts: EngineTimeouts,
}

/// One column row as returned by `information_schema.COLUMNS`.
struct RawColumn {
    name: String,
    column_type: String,
    nullable: String,
    key: String,
    default_value: Option<String>,
}

/// Fold raw column rows into column metadata and the table's primary key.
fn map_columns(raw: Vec<RawColumn>) -> (Vec<ColumnMetadata>, Option<String>) {
    let mut primary_key = None;
    let columns = raw
        .into_iter()
        .map(|col| {
            let mut meta = ColumnMetadata::new(col.name.clone(), col.column_type)
                .with_nullable(col.nullable == "YES")
                .with_default(col.default_value);
            match col.key.as_str() {
                "PRI" => {
                    if primary_key.is_none() {
                        primary_key = Some(col.name);
                    }
                }
                "UNI" => meta = meta.with_unique(true),
                "" => {}
                _ => meta = meta.with_indexed(true),
            }
            meta
        })
        .collect();
    (columns, primary_key)
}

impl MySqlExtractor {
    pub fn new(timeouts: EngineTimeouts) -> Self {
        Self { timeouts }
    }

    async fn fetch_tables(pool: &MySqlPool) -> GatewayResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            ORDER BY TABLE_NAME
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| GatewayError::MetadataExtraction(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.get("TABLE_NAME")).collect())
    }

    async fn fetch_raw_columns(pool: &MySqlPool, table: &str) -> GatewayResult<Vec<RawColumn>> {
        let rows = sqlx::query(
            r#"
            SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_KEY, COLUMN_DEFAULT
            FROM information_schema.COLUMNS
            WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| GatewayError::MetadataExtraction(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| RawColumn {
                name: row.get("COLUMN_NAME"),
                column_type: row.get("COLUMN_TYPE"),
                nullable: row.get("IS_NULLABLE"),
                key: row.get("COLUMN_KEY"),
                default_value: row.get("COLUMN_DEFAULT"),
            })
            .collect())
    }
}

#[async_trait]
impl SchemaExtractor for MySqlExtractor {
    fn engine(&self) -> EngineType {
        EngineType::MySQL
    }

    async fn list_tables(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<String>> {
        let pool = open_pool(descriptor, self.timeouts).await?;
        let result = with_timeout(self.timeouts.query, Self::fetch_tables(&pool)).await;
        pool.close().await;
        result
    }

    async fn list_columns(
        &self,
        descriptor: &ConnectionDescriptor,
        table: &str,
    ) -> GatewayResult<Vec<ColumnMetadata>> {
        let pool = open_pool(descriptor, self.timeouts).await?;
        let result =
            with_timeout(self.timeouts.query, Self::fetch_raw_columns(&pool, table)).await;
        pool.close().await;
        result.map(|raw| map_columns(raw).0)
    }

    /// Full walk over one connection: tables, then columns per table. Any
    /// failure aborts the whole extraction.
    async fn extract(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<TableMetadata>> {
        let pool = open_pool(descriptor, self.timeouts).await?;

        let walk = async {
            let mut tables = Vec::new();
            for name in Self::fetch_tables(&pool).await? {
                let raw = Self::fetch_raw_columns(&pool, &name).await?;
                let (columns, primary_key) = map_columns(raw);
                tables.push(TableMetadata::new(name, columns).with_primary_key(primary_key));
            }
            Ok(tables)
        };

        let result = with_timeout(self.timeouts.query, walk).await;
        pool.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, key: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            column_type: "int".to_string(),
            nullable: "NO".to_string(),
            key: key.to_string(),
            default_value: None,
        }
    }

    #[test]
    fn pri_column_becomes_primary_key() {
        let (columns, primary_key) = map_columns(vec![raw("id", "PRI"), raw("name", "")]);
        assert_eq!(primary_key.as_deref(), Some("id"));
        assert!(!columns[0].unique);
        assert!(!columns[0].indexed);
    }

    #[test]
    fn first_pri_column_wins_for_composite_keys() {
        let (_, primary_key) = map_columns(vec![raw("a", "PRI"), raw("b", "PRI")]);
        assert_eq!(primary_key.as_deref(), Some("a"));
    }

    #[test]
    fn uni_column_is_unique_not_indexed() {
        let (columns, primary_key) = map_columns(vec![raw("email", "UNI")]);
        assert!(primary_key.is_none());
        assert!(columns[0].unique);
        assert!(!columns[0].indexed);
    }

    #[test]
    fn mul_column_is_indexed() {
        let (columns, _) = map_columns(vec![raw("user_id", "MUL")]);
        assert!(!columns[0].unique);
        assert!(columns[0].indexed);
    }

    #[test]
    fn plain_column_has_no_key_flags() {
        let (columns, primary_key) = map_columns(vec![raw("note", "")]);
        assert!(primary_key.is_none());
        assert!(!columns[0].unique);
        assert!(!columns[0].indexed);
    }

    #[test]
    fn nullable_flag_follows_is_nullable() {
        let mut col = raw("note", "");
        col.nullable = "YES".to_string();
        let (columns, _) = map_columns(vec![col]);
        assert!(columns[0].nullable);
    }
}
