//! Typed error taxonomy for the gateway.
//!
//! Every driver-level failure is converted into one of these variants at the
//! tester/executor/extractor boundary; raw sqlx or HTTP errors never reach
//! the lifecycle manager or the coordinator.

use crate::engine::types::EngineType;

/// Errors surfaced by gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Ciphertext was malformed or encrypted under a different key.
    ///
    /// Callers must treat this as a tamper/authorization failure, not a
    /// transient error. The message never contains plaintext material.
    #[error("credential decryption failed: {0}")]
    Decryption(String),

    /// No capability registered for the requested engine tag.
    #[error("engine '{0}' is not supported for this operation")]
    UnsupportedEngine(EngineType),

    /// Handshake or authentication against the target engine failed.
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// Catalog introspection failed; connection creation is aborted.
    #[error("metadata extraction failed: {0}")]
    MetadataExtraction(String),

    /// The engine rejected or failed the query.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// A bounded wait elapsed before the engine responded.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Unknown connection id, or one owned by a different user.
    #[error("connection not found")]
    NotFound,

    /// The descriptor's parameters do not match its engine tag.
    #[error("invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    /// The gateway's own persistence layer failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        GatewayError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Storage(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_engine_message_names_the_tag() {
        let err = GatewayError::UnsupportedEngine(EngineType::Trino);
        assert!(err.to_string().contains("trino"));
    }

    #[test]
    fn test_decryption_message_is_opaque() {
        let err = GatewayError::Decryption("authentication tag mismatch".to_string());
        assert!(!err.to_string().contains("password"));
    }
}
