//! MySQL query executor.

use async_trait::async_trait;
use sqlx::MySqlPool;
use std::time::Instant;

use super::open_pool;
use super::values::MySqlValueConverter;
use crate::engine::drivers::is_select_query;
use crate::engine::envelope::ResultEnvelope;
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::QueryExecutor;
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

/// Executes a query over a fresh single-use connection.
pub struct MySqlExecutor {
    timeouts: EngineTimeouts,
}

impl MySqlExecutor {
    pub fn new(timeouts: EngineTimeouts) -> Self {
        Self { timeouts }
    }

    async fn run_query(&self, pool: &MySqlPool, sql: &str) -> GatewayResult<ResultEnvelope> {
        // Timing wraps the query call only, not connection setup.
        let start = Instant::now();

        if is_select_query(sql) {
            let rows = sqlx::query(sql)
                .fetch_all(pool)
                .await
                .map_err(|e| GatewayError::Execution(e.to_string()))?;
            let execution_time_ms = start.elapsed().as_millis();

            let columns = rows
                .first()
                .map(MySqlValueConverter::column_names)
                .unwrap_or_default();
            let converted = rows.iter().map(MySqlValueConverter::convert_row).collect();
            Ok(ResultEnvelope::select(columns, converted, execution_time_ms))
        } else {
            let result = sqlx::query(sql)
                .execute(pool)
                .await
                .map_err(|e| GatewayError::Execution(e.to_string()))?;
            let execution_time_ms = start.elapsed().as_millis();
            Ok(ResultEnvelope::modified(result.rows_affected(), execution_time_ms))
        }
    }
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    fn engine(&self) -> EngineType {
        EngineType::MySQL
    }

    async fn execute(
        &self,
        descriptor: &ConnectionDescriptor,
        sql: &str,
    ) -> GatewayResult<ResultEnvelope> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(GatewayError::Execution("empty query".to_string()));
        }

        let pool = open_pool(descriptor, self.timeouts).await?;
        // The pool is closed on every exit path, including timeout.
        let result = with_timeout(self.timeouts.query, self.run_query(&pool, sql)).await;
        pool.close().await;
        result
    }
}
