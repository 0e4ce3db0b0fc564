//! Galaxy connectivity tester.
//!
//! Requests an OAuth client-credentials token; a response carrying
//! `access_token` proves the domain and credentials are valid.

use async_trait::async_trait;

use super::GalaxyClient;
use crate::engine::registry::EngineTimeouts;
use crate::engine::traits::{ConnectionTester, TestOutcome};
use crate::engine::types::{ConnectionDescriptor, EngineType};
use crate::engine::with_timeout;
use crate::error::{GatewayError, GatewayResult};

pub struct GalaxyTester {
    engine: EngineType,
    timeouts: EngineTimeouts,
}

impl GalaxyTester {
    pub fn new(engine: EngineType, timeouts: EngineTimeouts) -> Self {
        Self { engine, timeouts }
    }
}

#[async_trait]
impl ConnectionTester for GalaxyTester {
    fn engine(&self) -> EngineType {
        self.engine
    }

    async fn test(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<TestOutcome> {
        let attempt = async {
            let client = GalaxyClient::from_descriptor(descriptor, self.timeouts)?;
            let token = client
                .post_json(
                    "/oauth/v2/token",
                    "grant_type=client_credentials".to_string(),
                    "application/x-www-form-urlencoded",
                )
                .await?;

            if token.get("access_token").and_then(|v| v.as_str()).is_some() {
                Ok(())
            } else {
                let detail = token
                    .get("error_description")
                    .or_else(|| token.get("error"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("token response missing access_token");
                Err(GatewayError::Connectivity(detail.to_string()))
            }
        };

        match with_timeout(self.timeouts.connect, attempt).await {
            Ok(()) => Ok(TestOutcome::ok(format!(
                "{} connection successful",
                self.engine.display_name()
            ))),
            Err(GatewayError::InvalidDescriptor(msg)) => Err(GatewayError::InvalidDescriptor(msg)),
            Err(e) => {
                tracing::debug!(engine = %self.engine, error = %e, "galaxy connectivity test failed");
                Ok(TestOutcome::failed(e.to_string()))
            }
        }
    }
}
