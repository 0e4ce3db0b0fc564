//! Galaxy statement executor.
//!
//! Submits the query to `/v1/statement` and polls the returned query id
//! until the engine reports a terminal state. Result pages are absorbed
//! from every response seen along the way.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::time::{Duration, Instant};

use super::GalaxyClient;
use super::client::json_to_value;
use crate::engine::envelope::{Cell, ResultEnvelope, Row};
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::QueryExecutor;
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct GalaxyExecutor {
    engine: EngineType,
    timeouts: EngineTimeouts,
}

/// Columns and data rows accumulated across statement responses.
#[derive(Default)]
struct StatementPages {
    columns: Vec<String>,
    rows: Vec<Row>,
    update_count: Option<u64>,
}

impl StatementPages {
    /// Fold one statement response into the accumulated pages.
    fn absorb(&mut self, payload: &JsonValue) {
        if self.columns.is_empty() {
            if let Some(columns) = payload.get("columns").and_then(|v| v.as_array()) {
                self.columns = columns
                    .iter()
                    .filter_map(|c| c.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect();
            }
        }

        if let Some(data) = payload.get("data").and_then(|v| v.as_array()) {
            for entry in data {
                let values = entry.as_array().cloned().unwrap_or_default();
                let cells = self
                    .columns
                    .iter()
                    .zip(values.iter())
                    .map(|(name, value)| Cell::new(name.clone(), json_to_value(value)))
                    .collect();
                self.rows.push(Row::new(cells));
            }
        }

        if let Some(count) = payload.get("updateCount").and_then(|v| v.as_u64()) {
            self.update_count = Some(count);
        }
    }
}

/// Terminal query state reported by the engine, if any.
fn query_state(payload: &JsonValue) -> Option<String> {
    payload
        .get("state")
        .or_else(|| payload.get("stats").and_then(|s| s.get("state")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn failure_message(payload: &JsonValue) -> String {
    payload
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("query failed")
        .to_string()
}

impl GalaxyExecutor {
    pub fn new(engine: EngineType, timeouts: EngineTimeouts) -> Self {
        Self { engine, timeouts }
    }

    async fn run_statement(&self, client: &GalaxyClient, sql: &str) -> GatewayResult<ResultEnvelope> {
        let start = Instant::now();

        let submitted = client
            .post_json("/v1/statement", json!({ "query": sql }).to_string(), "application/json")
            .await
            .map_err(|e| GatewayError::Execution(e.to_string()))?;

        let query_id = submitted
            .get("queryId")
            .or_else(|| submitted.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GatewayError::Execution("statement response missing query id".to_string())
            })?;

        let mut pages = StatementPages::default();
        pages.absorb(&submitted);

        let status_path = format!("/v1/statement/{}", query_id);
        loop {
            let payload = client
                .get_json(&status_path)
                .await
                .map_err(|e| GatewayError::Execution(e.to_string()))?;
            pages.absorb(&payload);

            match query_state(&payload).as_deref() {
                Some("FINISHED") => break,
                Some("FAILED") | Some("CANCELED") => {
                    return Err(GatewayError::Execution(failure_message(&payload)));
                }
                _ => smol::Timer::after(POLL_INTERVAL).await,
            };
        }

        let execution_time_ms = start.elapsed().as_millis();
        if pages.columns.is_empty() {
            Ok(ResultEnvelope::modified(
                pages.update_count.unwrap_or(0),
                execution_time_ms,
            ))
        } else {
            Ok(ResultEnvelope::select(pages.columns, pages.rows, execution_time_ms))
        }
    }
}

#[async_trait]
impl QueryExecutor for GalaxyExecutor {
    fn engine(&self) -> EngineType {
        self.engine
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

        let client = GalaxyClient::from_descriptor(descriptor, self.timeouts)?;
        with_timeout(self.timeouts.query, self.run_statement(&client, sql)).await
    }
}
