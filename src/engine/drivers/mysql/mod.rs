//! MySQL driver: tester, executor, and metadata extractor over sqlx.

mod executor;
mod extractor;
mod tester;
mod values;

pub use executor::MySqlExecutor;
pub use extractor::MySqlExtractor;
pub use tester::MySqlTester;

use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};

use crate::engine::registry::EngineTimeouts;
use crate::engine::types::{ConnectionDescriptor, DescriptorParams};
use crate::error::{GatewayError, GatewayResult};

/// Build connect options from a descriptor.
fn connect_options(descriptor: &ConnectionDescriptor) -> GatewayResult<MySqlConnectOptions> {
    match &descriptor.params {
        DescriptorParams::Server { host, port, username, password, database, tls } => {
            let ssl_mode = if *tls { MySqlSslMode::Required } else { MySqlSslMode::Preferred };
            Ok(MySqlConnectOptions::new()
                .host(host)
                .port(*port)
                .username(username)
                .password(password)
                .database(database)
                .ssl_mode(ssl_mode))
        }
        DescriptorParams::Galaxy { .. } => Err(GatewayError::InvalidDescriptor(
            "MySQL requires server connection parameters".to_string(),
        )),
    }
}

/// Open a fresh single-connection pool for one operation.
async fn open_pool(
    descriptor: &ConnectionDescriptor,
    timeouts: EngineTimeouts,
) -> GatewayResult<MySqlPool> {
    let options = connect_options(descriptor)?;
    MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(timeouts.connect)
        .connect_with(options)
        .await
        .map_err(|e| GatewayError::Connectivity(e.to_string()))
}
