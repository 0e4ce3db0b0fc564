//! Core engine capability traits.
//!
//! Three capabilities exist per engine because not every engine supports
//! every capability uniformly: the galaxy engines test connectivity with an
//! OAuth token exchange while the driver engines open a short-lived wire
//! connection. Each capability receives the plaintext descriptor for the
//! duration of one call and must not retain it.

use async_trait::async_trait;

use super::envelope::ResultEnvelope;
use super::metadata::{ColumnMetadata, TableMetadata};
use super::types::{ConnectionDescriptor, EngineType};
use crate::error::GatewayResult;

/// Outcome of a connectivity test.
///
/// Testers report reachability as data, not as an error: an unreachable
/// host is a normal answer for the caller, not a fault in the gateway.
/// The message must never contain descriptor secrets.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub ok: bool,
    pub message: String,
}

impl TestOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { ok: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { ok: false, message: message.into() }
    }
}

/// Capability: validate that a descriptor can reach its engine.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    /// The engine this tester handles
    fn engine(&self) -> EngineType;

    /// Open a short-lived connection (or perform a token exchange for
    /// HTTP-based engines) and release it immediately. Bounded by the
    /// configured connect timeout; a hung handshake reports `ok: false`
    /// rather than blocking the caller.
    async fn test(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<TestOutcome>;
}

/// Capability: run a query and return the normalized envelope.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The engine this executor handles
    fn engine(&self) -> EngineType;

    /// Execute `sql` over a fresh connection that is released on every exit
    /// path. Wall-clock timing covers the query call only. Driver errors
    /// are converted into `GatewayError::Execution`.
    async fn execute(
        &self,
        descriptor: &ConnectionDescriptor,
        sql: &str,
    ) -> GatewayResult<ResultEnvelope>;
}

/// Capability: enumerate tables and columns in the common shape.
#[async_trait]
pub trait SchemaExtractor: Send + Sync {
    /// The engine this extractor handles
    fn engine(&self) -> EngineType;

    /// List table names in the target database.
    async fn list_tables(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<String>>;

    /// List the columns of one table.
    async fn list_columns(
        &self,
        descriptor: &ConnectionDescriptor,
        table: &str,
    ) -> GatewayResult<Vec<ColumnMetadata>>;

    /// Extract the full table list with columns.
    ///
    /// The default walks `list_tables` then `list_columns` per table and
    /// aborts on the first failure; engines with a cheaper bulk path (the
    /// galaxy catalog walk) override it.
    async fn extract(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<Vec<TableMetadata>> {
        let mut tables = Vec::new();
        for name in self.list_tables(descriptor).await? {
            let columns = self.list_columns(descriptor, &name).await?;
            tables.push(TableMetadata::new(name, columns));
        }
        Ok(tables)
    }
}
