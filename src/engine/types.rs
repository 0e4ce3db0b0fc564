//! Engine tags and connection descriptors.
//!
//! This module contains:
//! - `EngineType` - The closed set of supported database engines
//! - `ConnectionDescriptor` - Plaintext connection details, in-memory only
//! - `DescriptorParams` - Engine-family-specific connection parameters

use serde::{Deserialize, Serialize};

/// Supported database engines.
///
/// PostgreSQL and MySQL are driver-based (wire protocol via sqlx); Trino and
/// Spark are analytic engines reachable only through an HTTP query-submission
/// API ("galaxy" style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    #[default]
    PostgreSQL,
    MySQL,
    Trino,
    Spark,
}

impl EngineType {
    /// Get the display name for this engine
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::Trino => "Trino",
            Self::Spark => "Spark",
        }
    }

    /// Get the default port for driver-based engines
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::PostgreSQL => Some(5432),
            Self::MySQL => Some(3306),
            Self::Trino | Self::Spark => None, // reached through an HTTPS domain
        }
    }

    /// Check if this engine is reached through an HTTP query API
    pub fn is_http_based(&self) -> bool {
        matches!(self, Self::Trino | Self::Spark)
    }

    /// Get all supported engines
    pub fn all() -> Vec<EngineType> {
        vec![Self::PostgreSQL, Self::MySQL, Self::Trino, Self::Spark]
    }

    /// Parse from a string tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "trino" => Some(Self::Trino),
            "spark" => Some(Self::Spark),
            _ => None,
        }
    }

    /// Convert to the string tag used for storage and dispatch
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::Trino => "trino",
            Self::Spark => "spark",
        }
    }
}

impl std::fmt::Display for EngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Plaintext connection details for one engine.
///
/// A descriptor only ever exists transiently in memory: it is reconstructed
/// by the vault on each use and never persisted or logged. The `Debug`
/// implementation redacts secrets so a stray log line cannot leak them.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDescriptor {
    /// Which engine this descriptor targets
    pub engine: EngineType,
    /// Engine-family-specific parameters
    pub params: DescriptorParams,
}

/// Connection parameters for the two engine families.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DescriptorParams {
    /// Driver-based engines (PostgreSQL, MySQL)
    Server {
        /// Server hostname or IP address
        host: String,
        /// Server port
        port: u16,
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
        /// Database to connect to
        database: String,
        /// Require TLS for the connection
        #[serde(default)]
        tls: bool,
    },

    /// HTTP-based analytic engines (Trino, Spark)
    Galaxy {
        /// Base URL of the query-submission API, e.g. `https://acme.galaxy.example`
        domain: String,
        /// OAuth client id
        client_id: String,
        /// OAuth client secret / API key
        api_key: String,
        /// Default catalog, used as the logical database name
        #[serde(default)]
        catalog: Option<String>,
    },
}

impl ConnectionDescriptor {
    /// Create a descriptor for a driver-based engine
    pub fn server(
        engine: EngineType,
        host: String,
        port: u16,
        username: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine,
            params: DescriptorParams::Server {
                host,
                port,
                username,
                password,
                database,
                tls: false,
            },
        }
    }

    /// Create a descriptor for an HTTP-based engine
    pub fn galaxy(engine: EngineType, domain: String, client_id: String, api_key: String) -> Self {
        Self {
            engine,
            params: DescriptorParams::Galaxy {
                domain,
                client_id,
                api_key,
                catalog: None,
            },
        }
    }

    /// Validate that the params match the engine family.
    pub fn validate(&self) -> Result<(), String> {
        match (&self.engine, &self.params) {
            (EngineType::PostgreSQL | EngineType::MySQL, DescriptorParams::Galaxy { .. }) => Err(
                format!("{} requires server connection parameters", self.engine.display_name()),
            ),
            (EngineType::Trino | EngineType::Spark, DescriptorParams::Server { .. }) => Err(
                format!("{} requires galaxy connection parameters", self.engine.display_name()),
            ),
            _ => Ok(()),
        }
    }

    /// The logical database name used for metadata documents and history.
    pub fn database_name(&self) -> String {
        match &self.params {
            DescriptorParams::Server { database, .. } => database.clone(),
            DescriptorParams::Galaxy { catalog, domain, .. } => {
                catalog.clone().unwrap_or_else(|| domain.clone())
            }
        }
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.params {
            DescriptorParams::Server { host, port, username, database, tls, .. } => f
                .debug_struct("ConnectionDescriptor")
                .field("engine", &self.engine)
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &"<redacted>")
                .field("database", database)
                .field("tls", tls)
                .finish(),
            DescriptorParams::Galaxy { domain, client_id, catalog, .. } => f
                .debug_struct("ConnectionDescriptor")
                .field("engine", &self.engine)
                .field("domain", domain)
                .field("client_id", client_id)
                .field("api_key", &"<redacted>")
                .field("catalog", catalog)
                .finish(),
        }
    }
}
