//! Immutable dispatch tables for engine capabilities.
//!
//! Three independent registries (testers, executors, extractors) are
//! populated once at startup and never mutated afterwards, so lookups need
//! no locking. An unregistered tag yields a typed `UnsupportedEngine`
//! error rather than a null usable downstream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::drivers::galaxy::{GalaxyExecutor, GalaxyExtractor, GalaxyTester};
use super::drivers::mysql::{MySqlExecutor, MySqlExtractor, MySqlTester};
use super::drivers::postgres::{PostgresExecutor, PostgresExtractor, PostgresTester};
use super::traits::{ConnectionTester, QueryExecutor, SchemaExtractor};
use super::types::EngineType;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// Timeouts applied by every driver to its network-facing calls.
#[derive(Debug, Clone, Copy)]
pub struct EngineTimeouts {
    /// Bound on connect/handshake and token exchange
    pub connect: Duration,
    /// Bound on a single query execution
    pub query: Duration,
    /// Bound on one HTTP round-trip (galaxy engines)
    pub http: Duration,
}

impl Default for EngineTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            query: Duration::from_secs(30),
            http: Duration::from_secs(10),
        }
    }
}

impl From<&GatewayConfig> for EngineTimeouts {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            connect: config.connect_timeout,
            query: config.query_timeout,
            http: config.http_timeout,
        }
    }
}

/// The three capability dispatch tables.
pub struct EngineRegistry {
    testers: HashMap<EngineType, Arc<dyn ConnectionTester>>,
    executors: HashMap<EngineType, Arc<dyn QueryExecutor>>,
    extractors: HashMap<EngineType, Arc<dyn SchemaExtractor>>,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("testers", &self.testers.keys().collect::<Vec<_>>())
            .field("executors", &self.executors.keys().collect::<Vec<_>>())
            .field("extractors", &self.extractors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EngineRegistry {
    /// Create an empty registry. Used directly only by tests; production
    /// code goes through `with_default_engines`.
    pub fn new() -> Self {
        Self {
            testers: HashMap::new(),
            executors: HashMap::new(),
            extractors: HashMap::new(),
        }
    }

    /// Build the registry with every supported engine registered.
    pub fn with_default_engines(timeouts: EngineTimeouts) -> Self {
        let mut registry = Self::new();

        registry.register_tester(Arc::new(PostgresTester::new(timeouts)));
        registry.register_executor(Arc::new(PostgresExecutor::new(timeouts)));
        registry.register_extractor(Arc::new(PostgresExtractor::new(timeouts)));

        registry.register_tester(Arc::new(MySqlTester::new(timeouts)));
        registry.register_executor(Arc::new(MySqlExecutor::new(timeouts)));
        registry.register_extractor(Arc::new(MySqlExtractor::new(timeouts)));

        // Trino and Spark share the galaxy protocol; each gets its own
        // registration so lookup stays a plain tag match.
        for engine in [EngineType::Trino, EngineType::Spark] {
            registry.register_tester(Arc::new(GalaxyTester::new(engine, timeouts)));
            registry.register_executor(Arc::new(GalaxyExecutor::new(engine, timeouts)));
            registry.register_extractor(Arc::new(GalaxyExtractor::new(engine, timeouts)));
        }

        tracing::debug!(registry = ?registry, "engine registry initialized");
        registry
    }

    /// Register a tester. Startup-time only.
    pub fn register_tester(&mut self, tester: Arc<dyn ConnectionTester>) {
        self.testers.insert(tester.engine(), tester);
    }

    /// Register an executor. Startup-time only.
    pub fn register_executor(&mut self, executor: Arc<dyn QueryExecutor>) {
        self.executors.insert(executor.engine(), executor);
    }

    /// Register an extractor. Startup-time only.
    pub fn register_extractor(&mut self, extractor: Arc<dyn SchemaExtractor>) {
        self.extractors.insert(extractor.engine(), extractor);
    }

    /// Look up the tester for an engine tag.
    pub fn tester(&self, engine: EngineType) -> GatewayResult<Arc<dyn ConnectionTester>> {
        self.testers
            .get(&engine)
            .cloned()
            .ok_or(GatewayError::UnsupportedEngine(engine))
    }

    /// Look up the executor for an engine tag.
    pub fn executor(&self, engine: EngineType) -> GatewayResult<Arc<dyn QueryExecutor>> {
        self.executors
            .get(&engine)
            .cloned()
            .ok_or(GatewayError::UnsupportedEngine(engine))
    }

    /// Look up the extractor for an engine tag.
    pub fn extractor(&self, engine: EngineType) -> GatewayResult<Arc<dyn SchemaExtractor>> {
        self.extractors
            .get(&engine)
            .cloned()
            .ok_or(GatewayError::UnsupportedEngine(engine))
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_default_engines(EngineTimeouts::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_covers_all_engines() {
        let registry = EngineRegistry::with_default_engines(EngineTimeouts::default());
        for engine in EngineType::all() {
            assert!(registry.tester(engine).is_ok(), "missing tester for {engine}");
            assert!(registry.executor(engine).is_ok(), "missing executor for {engine}");
            assert!(registry.extractor(engine).is_ok(), "missing extractor for {engine}");
        }
    }

    #[test]
    fn test_empty_registry_reports_unsupported_engine() {
        let registry = EngineRegistry::new();
        let err = registry
            .executor(EngineType::MySQL)
            .err()
            .expect("lookup should fail on an empty registry");
        assert!(matches!(err, GatewayError::UnsupportedEngine(EngineType::MySQL)));
        assert!(matches!(
            registry.tester(EngineType::Trino),
            Err(GatewayError::UnsupportedEngine(_))
        ));
        assert!(matches!(
            registry.extractor(EngineType::Spark),
            Err(GatewayError::UnsupportedEngine(_))
        ));
    }
}
