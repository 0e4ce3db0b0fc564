//! Engine abstraction: tags, descriptors, capability traits, and the
//! per-engine driver implementations behind the dispatch registries.

pub mod drivers;
pub mod envelope;
pub mod metadata;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use envelope::{Cell, ExecutionMetadata, ResultEnvelope, Row, Value};
pub use metadata::{ColumnMetadata, DatabaseMetadata, TableMetadata};
pub use registry::{EngineRegistry, EngineTimeouts};
pub use traits::{ConnectionTester, QueryExecutor, SchemaExtractor, TestOutcome};
pub use types::{ConnectionDescriptor, DescriptorParams, EngineType};

use std::future::Future;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};

/// Race a fallible future against a deadline.
///
/// A timeout converts into `GatewayError::Timeout` on the same typed error
/// channel as a driver failure; it is fatal only to the one operation.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = GatewayResult<T>>,
) -> GatewayResult<T> {
    let deadline = async {
        smol::Timer::after(limit).await;
        Err(GatewayError::Timeout(limit))
    };
    smol::future::race(fut, deadline).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_timeout_converts_hangs() {
        let result: GatewayResult<()> = smol::block_on(with_timeout(
            Duration::from_millis(10),
            std::future::pending(),
        ));
        assert!(matches!(result, Err(GatewayError::Timeout(_))));
    }

    #[test]
    fn test_with_timeout_passes_through_fast_results() {
        let result = smol::block_on(with_timeout(Duration::from_secs(1), async { Ok(42) }));
        assert_eq!(result.unwrap(), 42);
    }
}
