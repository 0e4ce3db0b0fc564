//! Gateway configuration.
//!
//! Read once at startup from the environment, with defaults suitable for
//! local development. The secret salt has no default: without it the vault
//! cannot derive stable per-user keys.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Environment variable holding the vault's server-side secret salt.
pub const SECRET_SALT_ENV: &str = "QUERYGATE_SECRET_SALT";
/// Environment variable overriding the sqlite database path.
pub const DB_PATH_ENV: &str = "QUERYGATE_DB_PATH";

/// Runtime configuration for the gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Server-side secret salt for per-user key derivation
    pub secret_salt: String,
    /// Path of the gateway's own sqlite database
    pub db_path: PathBuf,
    /// Bound on connect/handshake and token exchange
    pub connect_timeout: Duration,
    /// Bound on a single query execution
    pub query_timeout: Duration,
    /// Bound on one HTTP round-trip against a galaxy engine
    pub http_timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("secret_salt", &"<redacted>")
            .field("db_path", &self.db_path)
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Build a configuration with explicit salt and database path.
    pub fn new(secret_salt: impl Into<String>, db_path: PathBuf) -> Self {
        Self {
            secret_salt: secret_salt.into(),
            db_path,
            connect_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(10),
        }
    }

    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails if the secret salt variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let secret_salt = std::env::var(SECRET_SALT_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .with_context(|| format!("{SECRET_SALT_ENV} must be set"))?;

        let db_path = match std::env::var(DB_PATH_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::default_db_path()?,
        };

        Ok(Self::new(secret_salt, db_path))
    }

    fn default_db_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".querygate").join("querygate.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_default_timeouts() {
        let config = GatewayConfig::new("salt", PathBuf::from("/tmp/qg.db"));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_debug_redacts_salt() {
        let config = GatewayConfig::new("very-secret", PathBuf::from("/tmp/qg.db"));
        assert!(!format!("{config:?}").contains("very-secret"));
    }
}
