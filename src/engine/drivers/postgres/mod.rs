//! PostgreSQL driver: tester, executor, and metadata extractor over sqlx.

mod executor;
mod extractor;
mod tester;
mod values;

pub use executor::PostgresExecutor;
pub use extractor::PostgresExtractor;
pub use tester::PostgresTester;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use crate::engine::registry::EngineTimeouts;
use crate::engine::types::{ConnectionDescriptor, DescriptorParams};
use crate::error::{GatewayError, GatewayResult};

/// Build connect options from a descriptor.
fn connect_options(descriptor: &ConnectionDescriptor) -> GatewayResult<PgConnectOptions> {
    match &descriptor.params {
        DescriptorParams::Server { host, port, username, password, database, tls } => {
            let ssl_mode = if *tls { PgSslMode::Require } else { PgSslMode::Prefer };
            Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(username)
                .password(password)
                .database(database)
                .ssl_mode(ssl_mode))
        }
        DescriptorParams::Galaxy { .. } => Err(GatewayError::InvalidDescriptor(
            "PostgreSQL requires server connection parameters".to_string(),
        )),
    }
}

/// Open a fresh single-connection pool for one operation.
///
/// Each gateway operation owns exactly one connection for its lifetime;
/// callers must close the pool on every exit path.
async fn open_pool(
    descriptor: &ConnectionDescriptor,
    timeouts: EngineTimeouts,
) -> GatewayResult<PgPool> {
    let options = connect_options(descriptor)?;
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(timeouts.connect)
        .connect_with(options)
        .await
        .map_err(|e| GatewayError::Connectivity(e.to_string()))
}
