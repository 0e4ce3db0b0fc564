//! Connection lifecycle management.
//!
//! Creating a connection is an all-or-nothing sequence: validate the
//! descriptor, extract the schema, then persist the encrypted record and
//! its metadata together. A failed extraction leaves nothing behind.

use std::sync::Arc;
use uuid::Uuid;

use crate::engine::metadata::DatabaseMetadata;
use crate::engine::registry::EngineRegistry;
use crate::engine::traits::TestOutcome;
use crate::engine::types::ConnectionDescriptor;
use crate::error::{GatewayError, GatewayResult};
use crate::store::{ConnectionRecord, ConnectionStatus, GatewayStore};
use crate::vault::CredentialVault;

pub struct ConnectionLifecycleManager {
    store: GatewayStore,
    vault: Arc<CredentialVault>,
    registry: Arc<EngineRegistry>,
}

impl ConnectionLifecycleManager {
    pub fn new(
        store: GatewayStore,
        vault: Arc<CredentialVault>,
        registry: Arc<EngineRegistry>,
    ) -> Self {
        Self { store, vault, registry }
    }

    /// Create a connection from a plaintext descriptor.
    ///
    /// The descriptor is validated, the schema extracted, and only then is
    /// anything persisted. The stored payload is ciphertext under the
    /// user's derived key.
    pub async fn create(
        &self,
        user_id: &Uuid,
        descriptor: &ConnectionDescriptor,
    ) -> GatewayResult<ConnectionRecord> {
        descriptor.validate().map_err(GatewayError::InvalidDescriptor)?;

        let extractor = self.registry.extractor(descriptor.engine)?;
        let tables = extractor.extract(descriptor).await?;

        let key = self.vault.derive_key(user_id);
        let encrypted_payload = self.vault.encrypt(descriptor, &key)?;

        let record = ConnectionRecord::new(*user_id, encrypted_payload);
        self.store.connections().create(&record).await?;

        let metadata =
            DatabaseMetadata::new(*user_id, record.id, descriptor.database_name(), tables);
        self.store.metadata().upsert(&metadata).await?;

        tracing::info!(
            connection_id = %record.id,
            engine = %descriptor.engine,
            tables = metadata.tables.len(),
            "connection created"
        );
        Ok(record)
    }

    /// Create a connection from a payload already encrypted under the
    /// user's key.
    pub async fn create_encrypted(
        &self,
        user_id: &Uuid,
        encrypted_payload: &str,
    ) -> GatewayResult<ConnectionRecord> {
        let key = self.vault.derive_key(user_id);
        let descriptor = self.vault.decrypt(encrypted_payload, &key)?;
        self.create(user_id, &descriptor).await
    }

    /// Replace a connection's descriptor, re-encrypting under the user's
    /// key. When `refresh_metadata` is set the schema is re-extracted and
    /// the stored document replaced.
    pub async fn update(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
        descriptor: &ConnectionDescriptor,
        refresh_metadata: bool,
    ) -> GatewayResult<()> {
        descriptor.validate().map_err(GatewayError::InvalidDescriptor)?;

        let existing = self
            .store
            .connections()
            .get(user_id, connection_id)
            .await?
            .ok_or(GatewayError::NotFound)?;

        let key = self.vault.derive_key(user_id);
        let encrypted_payload = self.vault.encrypt(descriptor, &key)?;
        self.store
            .connections()
            .update_payload(user_id, &existing.id, &encrypted_payload)
            .await?;

        if refresh_metadata {
            let extractor = self.registry.extractor(descriptor.engine)?;
            let tables = extractor.extract(descriptor).await?;
            let metadata =
                DatabaseMetadata::new(*user_id, existing.id, descriptor.database_name(), tables);
            self.store.metadata().upsert(&metadata).await?;
        }

        tracing::info!(connection_id = %connection_id, refresh_metadata, "connection updated");
        Ok(())
    }

    /// Delete a connection and its metadata together.
    pub async fn delete(&self, user_id: &Uuid, connection_id: &Uuid) -> GatewayResult<()> {
        let removed = self.store.connections().delete(user_id, connection_id).await?;
        if !removed {
            return Err(GatewayError::NotFound);
        }
        self.store.metadata().delete_for_connection(user_id, connection_id).await?;

        tracing::info!(connection_id = %connection_id, "connection deleted");
        Ok(())
    }

    /// All connections owned by the user.
    pub async fn list(&self, user_id: &Uuid) -> GatewayResult<Vec<ConnectionRecord>> {
        self.store.connections().list(user_id).await
    }

    /// Stored schema metadata for one connection.
    pub async fn get_metadata(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
    ) -> GatewayResult<DatabaseMetadata> {
        self.store
            .metadata()
            .get(user_id, connection_id)
            .await?
            .ok_or(GatewayError::NotFound)
    }

    /// Move a stored connection to a new lifecycle state.
    pub async fn set_status(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
        status: ConnectionStatus,
    ) -> GatewayResult<()> {
        let updated = self
            .store
            .connections()
            .update_status(user_id, connection_id, status)
            .await?;
        if !updated {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    /// Probe connectivity for a plaintext descriptor without persisting
    /// anything.
    pub async fn test(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<TestOutcome> {
        descriptor.validate().map_err(GatewayError::InvalidDescriptor)?;
        let tester = self.registry.tester(descriptor.engine)?;
        tester.test(descriptor).await
    }

    /// Probe connectivity for a payload encrypted under the user's key,
    /// without persisting anything.
    pub async fn test_encrypted(
        &self,
        user_id: &Uuid,
        encrypted_payload: &str,
    ) -> GatewayResult<TestOutcome> {
        let key = self.vault.derive_key(user_id);
        let descriptor = self.vault.decrypt(encrypted_payload, &key)?;
        self.test(&descriptor).await
    }

    /// Probe connectivity for a stored connection by decrypting its
    /// payload first.
    pub async fn test_stored(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
    ) -> GatewayResult<TestOutcome> {
        let record = self
            .store
            .connections()
            .get(user_id, connection_id)
            .await?
            .ok_or(GatewayError::NotFound)?;

        let key = self.vault.derive_key(user_id);
        let descriptor = self.vault.decrypt(&record.encrypted_payload, &key)?;
        self.test(&descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::engine::metadata::{ColumnMetadata, TableMetadata};
    use crate::engine::traits::SchemaExtractor;
    use crate::engine::types::EngineType;

    struct StubExtractor {
        engine: EngineType,
        fail: bool,
    }

    #[async_trait]
    impl SchemaExtractor for StubExtractor {
        fn engine(&self) -> EngineType {
            self.engine
        }

        async fn list_tables(&self, _: &ConnectionDescriptor) -> GatewayResult<Vec<String>> {
            Ok(vec!["users".to_string(), "orders".to_string()])
        }

        async fn list_columns(
            &self,
            _: &ConnectionDescriptor,
            _: &str,
        ) -> GatewayResult<Vec<ColumnMetadata>> {
            Ok(vec![ColumnMetadata::new("id", "integer")])
        }

        async fn extract(&self, _: &ConnectionDescriptor) -> GatewayResult<Vec<TableMetadata>> {
            if self.fail {
                return Err(GatewayError::MetadataExtraction("unreachable host".to_string()));
            }
            Ok(vec![
                TableMetadata::new("users", vec![ColumnMetadata::new("id", "integer")])
                    .with_primary_key(Some("id".to_string())),
                TableMetadata::new("orders", vec![ColumnMetadata::new("id", "integer")]),
            ])
        }
    }

    fn manager_with(extractor: StubExtractor, store: GatewayStore) -> ConnectionLifecycleManager {
        let mut registry = EngineRegistry::new();
        registry.register_extractor(Arc::new(extractor));
        ConnectionLifecycleManager::new(
            store,
            Arc::new(CredentialVault::new("test-salt")),
            Arc::new(registry),
        )
    }

    fn pg_descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::server(
            EngineType::PostgreSQL,
            "localhost".to_string(),
            5432,
            "app".to_string(),
            "secret".to_string(),
            "shop".to_string(),
        )
    }

    #[test]
    fn create_persists_record_and_metadata() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::PostgreSQL, fail: false },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let record = manager.create(&user, &pg_descriptor()).await.unwrap();
            assert_eq!(record.status, ConnectionStatus::Connected);
            assert!(record.last_connected_at.is_some());
            // The plaintext password never reaches the store.
            assert!(!record.encrypted_payload.contains("secret"));

            let metadata = manager.get_metadata(&user, &record.id).await.unwrap();
            assert_eq!(metadata.db_name, "shop");
            assert_eq!(metadata.tables.len(), 2);
            assert!(metadata.get_table("users").is_some());
            assert_eq!(
                metadata.get_table("users").unwrap().primary_key.as_deref(),
                Some("id")
            );
        });
    }

    #[test]
    fn failed_extraction_persists_nothing() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::PostgreSQL, fail: true },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let err = manager.create(&user, &pg_descriptor()).await.unwrap_err();
            assert!(matches!(err, GatewayError::MetadataExtraction(_)));
            assert!(manager.list(&user).await.unwrap().is_empty());
        });
    }

    #[test]
    fn create_rejects_mismatched_params() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::PostgreSQL, fail: false },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let descriptor = ConnectionDescriptor::galaxy(
                EngineType::PostgreSQL,
                "acme.galaxy.starburst.io".to_string(),
                "client".to_string(),
                "key".to_string(),
            );
            let err = manager.create(&user, &descriptor).await.unwrap_err();
            assert!(matches!(err, GatewayError::InvalidDescriptor(_)));
        });
    }

    #[test]
    fn create_without_registered_engine_is_unsupported() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::MySQL, fail: false },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let err = manager.create(&user, &pg_descriptor()).await.unwrap_err();
            assert!(matches!(err, GatewayError::UnsupportedEngine(EngineType::PostgreSQL)));
        });
    }

    #[test]
    fn delete_removes_record_and_metadata() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::PostgreSQL, fail: false },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let record = manager.create(&user, &pg_descriptor()).await.unwrap();
            manager.delete(&user, &record.id).await.unwrap();

            assert!(manager.list(&user).await.unwrap().is_empty());
            let err = manager.get_metadata(&user, &record.id).await.unwrap_err();
            assert!(matches!(err, GatewayError::NotFound));
        });
    }

    #[test]
    fn update_reencrypts_and_optionally_refreshes_metadata() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::PostgreSQL, fail: false },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let record = manager.create(&user, &pg_descriptor()).await.unwrap();
            let before = record.encrypted_payload.clone();

            let mut descriptor = pg_descriptor();
            if let crate::engine::types::DescriptorParams::Server { database, .. } =
                &mut descriptor.params
            {
                *database = "warehouse".to_string();
            }
            manager.update(&user, &record.id, &descriptor, true).await.unwrap();

            let after = manager.list(&user).await.unwrap().remove(0);
            assert_ne!(after.encrypted_payload, before);
            let metadata = manager.get_metadata(&user, &record.id).await.unwrap();
            assert_eq!(metadata.db_name, "warehouse");
        });
    }

    #[test]
    fn update_unknown_connection_is_not_found() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let manager = manager_with(
                StubExtractor { engine: EngineType::PostgreSQL, fail: false },
                store.clone(),
            );
            let user = Uuid::new_v4();

            let err = manager
                .update(&user, &Uuid::new_v4(), &pg_descriptor(), false)
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::NotFound));
        });
    }
}
