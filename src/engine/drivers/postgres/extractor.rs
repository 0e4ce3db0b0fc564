//! PostgreSQL metadata extractor.
//!
//! Tables and columns come from the `information_schema` catalog views,
//! queried per table against the `public` schema. The primary key is
//! recovered from `table_constraints`/`key_column_usage`. The `unique` and
//! `indexed` flags are not introspected here and stay `false`; the source
//! views do not carry them.

use async_trait::async_trait;
use sqlx::{PgPool, Row as _};

use super::open_pool;
use crate::engine::metadata::{ColumnMetadata, TableMetadata};
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::SchemaExtractor;
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

pub struct PostgresExtractor {
    timeouts: EngineTimeouts,
}

impl PostgresExtractor {
    pub fn new(timeouts: EngineTimeouts) -> Self {
        Self { timeouts }
    }

    async fn fetch_tables(pool: &PgPool) -> GatewayResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
            ORDER BY table_name
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| GatewayError::MetadataExtraction(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.get("table_name")).collect())
    }

    async fn fetch_columns(pool: &PgPool, table: &str) -> GatewayResult<Vec<ColumnMetadata>> {
        let rows = sqlx::query(
            r#"
            SELECT column_name, data_type, is_nullable, column_default
            FROM information_schema.columns
            WHERE table_name = $1 AND table_schema = 'public'
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| GatewayError::MetadataExtraction(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let is_nullable: String = row.get("is_nullable");
                let default_value: Option<String> = row.get("column_default");
                ColumnMetadata::new(
                    row.get::<String, _>("column_name"),
                    row.get::<String, _>("data_type"),
                )
                .with_nullable(is_nullable == "YES")
                .with_default(default_value)
            })
            .collect())
    }

    async fn fetch_primary_key(pool: &PgPool, table: &str) -> GatewayResult<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_name = $1
                AND tc.table_schema = 'public'
                AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
            LIMIT 1
            "#,
        )
        .bind(table)
        .fetch_optional(pool)
        .await
        .map_err(|e| GatewayError::MetadataExtraction(e.to_string()))?;

        Ok(row.map(|r| r.get("column_name")))
    }
}

#[async_trait]
impl SchemaExtractor for PostgresExtractor {
    fn engine(&self) -> EngineType {
        EngineType::PostgreSQL
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
        let result = with_timeout(self.timeouts.query, Self::fetch_columns(&pool, table)).await;
        pool.close().await;
        result
    }

    /// Full walk over one connection: tables, then columns and primary key
    /// per table. Any failure aborts the whole extraction.
    async fn extract(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<TableMetadata>> {
        let pool = open_pool(descriptor, self.timeouts).await?;

        let walk = async {
            let mut tables = Vec::new();
            for name in Self::fetch_tables(&pool).await? {
                let columns = Self::fetch_columns(&pool, &name).await?;
                let primary_key = Self::fetch_primary_key(&pool, &name).await?;
                tables.push(TableMetadata::new(name, columns).with_primary_key(primary_key));
            }
            Ok(tables)
        };

        let result = with_timeout(self.timeouts.query, walk).await;
        pool.close().await;
        result
    }
}
