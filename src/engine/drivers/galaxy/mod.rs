//! Starburst Galaxy driver, shared by the Trino and Spark engines.
//!
//! Both engines front the same Galaxy HTTP surface: OAuth client-credentials
//! for connectivity checks, the `/v1/statement` protocol for queries, and
//! the `/v1/metadata` catalog walk for schema discovery.

mod client;
mod executor;
mod extractor;
mod tester;

pub use executor::GalaxyExecutor;
pub use extractor::GalaxyExtractor;
pub use tester::GalaxyTester;

pub(crate) use client::GalaxyClient;
