//! Storage record definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::envelope::ExecutionMetadata;

/// Lifecycle state of a stored connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Connecting,
    Disconnecting,
}

impl ConnectionStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Disconnecting => "disconnecting",
        }
    }

    /// Unknown values fall back to `Disconnected`.
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "connected" => ConnectionStatus::Connected,
            "connecting" => ConnectionStatus::Connecting,
            "disconnecting" => ConnectionStatus::Disconnecting,
            _ => ConnectionStatus::Disconnected,
        }
    }
}

/// A stored connection. The descriptor is held only as ciphertext.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub encrypted_payload: String,
    pub status: ConnectionStatus,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRecord {
    /// A freshly created connection that just passed extraction.
    pub fn new(user_id: Uuid, encrypted_payload: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            encrypted_payload,
            status: ConnectionStatus::Connected,
            last_connected_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One entry in the append-only query history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub query: String,
    pub status: HistoryStatus,
    pub db_name: String,
    pub error: Option<String>,
    pub response_metadata: Option<ExecutionMetadata>,
    pub response_time_ms: i64,
    pub rows: i64,
    pub affected_rows: i64,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of the recorded execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
}

impl HistoryStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            HistoryStatus::Success => "success",
            HistoryStatus::Failed => "failed",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "success" => HistoryStatus::Success,
            _ => HistoryStatus::Failed,
        }
    }
}

impl QueryHistoryRecord {
    /// Record a completed execution.
    pub fn success(
        user_id: Uuid,
        query: impl Into<String>,
        db_name: impl Into<String>,
        metadata: &ExecutionMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            query: query.into(),
            status: HistoryStatus::Success,
            db_name: db_name.into(),
            error: None,
            response_metadata: Some(metadata.clone()),
            response_time_ms: metadata.execution_time_ms as i64,
            rows: metadata.row_count as i64,
            affected_rows: metadata.affected_rows as i64,
            timestamp: Utc::now(),
        }
    }

    /// Record a failed execution.
    pub fn failure(
        user_id: Uuid,
        query: impl Into<String>,
        db_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            query: query.into(),
            status: HistoryStatus::Failed,
            db_name: db_name.into(),
            error: Some(error.into()),
            response_metadata: None,
            response_time_ms: 0,
            rows: 0,
            affected_rows: 0,
            timestamp: Utc::now(),
        }
    }
}
