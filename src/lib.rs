//! querygate: a heterogeneous database gateway.
//!
//! The gateway stores connection descriptors encrypted per user, extracts
//! and caches schema metadata, and executes queries against PostgreSQL,
//! MySQL, and Starburst Galaxy (Trino and Spark) engines through a common
//! trait surface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Gateway                              │
//! │  - Wires config into store, vault, and engine registry      │
//! └─────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │ ConnectionLifecycle      │   │ QueryCoordinator             │
//! │ Manager                  │   │  - decrypt, dispatch, record │
//! │  - create/update/delete  │   │    history                   │
//! │  - test, metadata        │   │                              │
//! └──────────────────────────┘   └──────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ EngineRegistry: tester / executor / extractor per engine     │
//! │   postgres │ mysql │ galaxy (trino, spark)                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod store;
pub mod vault;

pub use config::GatewayConfig;
pub use coordinator::QueryCoordinator;
pub use engine::envelope::{Cell, ExecutionMetadata, ResultEnvelope, Row, Value};
pub use engine::metadata::{ColumnMetadata, DatabaseMetadata, TableMetadata};
pub use engine::registry::{EngineRegistry, EngineTimeouts};
pub use engine::traits::{ConnectionTester, QueryExecutor, SchemaExtractor, TestOutcome};
pub use engine::types::{ConnectionDescriptor, DescriptorParams, EngineType};
pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use lifecycle::ConnectionLifecycleManager;
pub use store::{
    ConnectionRecord, ConnectionStatus, GatewayStore, HistoryStatus, QueryHistoryRecord,
};
pub use vault::CredentialVault;
