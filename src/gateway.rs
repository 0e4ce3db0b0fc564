//! Top-level gateway facade.
//!
//! Wires configuration into the store, vault, and engine registry, and
//! hands out the lifecycle manager and query coordinator that share them.

use anyhow::Result;
use async_lock::OnceCell;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::coordinator::QueryCoordinator;
use crate::engine::registry::{EngineRegistry, EngineTimeouts};
use crate::error::GatewayResult;
use crate::lifecycle::ConnectionLifecycleManager;
use crate::store::GatewayStore;
use crate::vault::CredentialVault;

pub struct Gateway {
    store: GatewayStore,
    vault: Arc<CredentialVault>,
    registry: Arc<EngineRegistry>,
}

/// Global singleton instance
static GATEWAY: OnceCell<Gateway> = OnceCell::new();

impl Gateway {
    /// Get or initialize the global gateway from environment configuration.
    /// Schema initialization only runs once.
    pub async fn singleton() -> Result<&'static Self> {
        GATEWAY
            .get_or_try_init(|| async {
                let config = GatewayConfig::from_env()?;
                let gateway = Self::open(&config).await?;
                Ok(gateway)
            })
            .await
    }

    /// Open the gateway with the default engines registered.
    pub async fn open(config: &GatewayConfig) -> GatewayResult<Self> {
        let store = GatewayStore::open(config).await?;
        let registry = EngineRegistry::with_default_engines(EngineTimeouts::from(config));
        Ok(Self::assemble(store, config, registry))
    }

    /// Assemble a gateway over an existing store and registry. Used by
    /// tests to substitute stub engines and an in-memory database.
    pub fn with_parts(store: GatewayStore, config: &GatewayConfig, registry: EngineRegistry) -> Self {
        Self::assemble(store, config, registry)
    }

    fn assemble(store: GatewayStore, config: &GatewayConfig, registry: EngineRegistry) -> Self {
        Self {
            store,
            vault: Arc::new(CredentialVault::new(config.secret_salt.clone())),
            registry: Arc::new(registry),
        }
    }

    /// Connection lifecycle operations: create, update, delete, list, test.
    pub fn lifecycle(&self) -> ConnectionLifecycleManager {
        ConnectionLifecycleManager::new(
            self.store.clone(),
            self.vault.clone(),
            self.registry.clone(),
        )
    }

    /// Query execution and history.
    pub fn coordinator(&self) -> QueryCoordinator {
        QueryCoordinator::new(self.store.clone(), self.vault.clone(), self.registry.clone())
    }
}
