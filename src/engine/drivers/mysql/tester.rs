//! MySQL connectivity tester.

use async_trait::async_trait;

use super::open_pool;
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::{ConnectionTester, TestOutcome};
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

/// Opens a short-lived connection and closes it immediately; success means
/// the handshake completed.
pub struct MySqlTester {
    timeouts: EngineTimeouts,
}

impl MySqlTester {
    pub fn new(timeouts: EngineTimeouts) -> Self {
        Self { timeouts }
    }
}

#[async_trait]
impl ConnectionTester for MySqlTester {
    fn engine(&self) -> EngineType {
        EngineType::MySQL
    }

    async fn test(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<TestOutcome> {
        let attempt = async {
            let pool = open_pool(descriptor, self.timeouts).await?;
            let ping = sqlx::query("SELECT 1").fetch_one(&pool).await;
            pool.close().await;
            ping.map_err(|e| GatewayError::Connectivity(e.to_string()))?;
            Ok(())
        };

        match with_timeout(self.timeouts.connect, attempt).await {
            Ok(()) => Ok(TestOutcome::ok("MySQL connection successful")),
            Err(GatewayError::InvalidDescriptor(msg)) => Err(GatewayError::InvalidDescriptor(msg)),
            Err(e) => {
                tracing::debug!(error = %e, "mysql connectivity test failed");
                Ok(TestOutcome::failed(e.to_string()))
            }
        }
    }
}
