//! Query execution coordination.
//!
//! One entry point runs a query against a stored connection: resolve the
//! record, decrypt the descriptor, dispatch to the engine's executor, and
//! append exactly one history entry before returning. Failures that occur
//! before a descriptor exists (missing record, failed decryption) produce
//! no history because there is no database to attribute them to.

use std::sync::Arc;
use uuid::Uuid;

use crate::engine::envelope::ResultEnvelope;
use crate::engine::registry::EngineRegistry;
use crate::error::{GatewayError, GatewayResult};
use crate::store::{GatewayStore, QueryHistoryRecord};
use crate::vault::CredentialVault;

pub struct QueryCoordinator {
    store: GatewayStore,
    vault: Arc<CredentialVault>,
    registry: Arc<EngineRegistry>,
}

impl QueryCoordinator {
    pub fn new(
        store: GatewayStore,
        vault: Arc<CredentialVault>,
        registry: Arc<EngineRegistry>,
    ) -> Self {
        Self { store, vault, registry }
    }

    /// Run a query against a stored connection.
    ///
    /// The history entry is written synchronously, so a returned result
    /// (or error) is always already recorded.
    pub async fn run(
        &self,
        user_id: &Uuid,
        connection_id: &Uuid,
        query: &str,
    ) -> GatewayResult<ResultEnvelope> {
        let record = self
            .store
            .connections()
            .get(user_id, connection_id)
            .await?
            .ok_or(GatewayError::NotFound)?;

        let key = self.vault.derive_key(user_id);
        let descriptor = self.vault.decrypt(&record.encrypted_payload, &key)?;
        let db_name = descriptor.database_name();

        let outcome = async {
            let executor = self.registry.executor(descriptor.engine)?;
            executor.execute(&descriptor, query).await
        }
        .await;

        let entry = match &outcome {
            Ok(envelope) => {
                QueryHistoryRecord::success(*user_id, query, &db_name, &envelope.metadata)
            }
            Err(e) => QueryHistoryRecord::failure(*user_id, query, &db_name, e.to_string()),
        };
        self.store.history().record(&entry).await?;

        match &outcome {
            Ok(envelope) => tracing::debug!(
                connection_id = %connection_id,
                rows = envelope.metadata.row_count,
                affected = envelope.metadata.affected_rows,
                elapsed_ms = envelope.metadata.execution_time_ms as u64,
                "query executed"
            ),
            Err(e) => tracing::debug!(
                connection_id = %connection_id,
                error = %e,
                "query failed"
            ),
        }

        outcome
    }

    /// The user's history, newest first.
    pub async fn history(&self, user_id: &Uuid) -> GatewayResult<Vec<QueryHistoryRecord>> {
        self.store.history().list(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    use crate::engine::envelope::{Row, Value};
    use crate::engine::traits::QueryExecutor;
    use crate::engine::types::{ConnectionDescriptor, EngineType};
    use crate::error::GatewayError;
    use crate::store::{ConnectionRecord, HistoryStatus};

    enum StubBehavior {
        OneRow,
        Fail,
        TimeOut,
    }

    struct StubExecutor {
        behavior: StubBehavior,
    }

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        fn engine(&self) -> EngineType {
            EngineType::PostgreSQL
        }

        async fn execute(
            &self,
            _: &ConnectionDescriptor,
            _: &str,
        ) -> GatewayResult<ResultEnvelope> {
            match self.behavior {
                StubBehavior::OneRow => Ok(ResultEnvelope::select(
                    vec!["?column?".to_string()],
                    vec![Row::from_pairs(vec![("?column?".to_string(), Value::Int32(1))])],
                    3,
                )),
                StubBehavior::Fail => Err(GatewayError::Execution("syntax error".to_string())),
                StubBehavior::TimeOut => Err(GatewayError::Timeout(Duration::from_secs(30))),
            }
        }
    }

    struct Fixture {
        coordinator: QueryCoordinator,
        user: Uuid,
        connection_id: Uuid,
    }

    /// A coordinator over an in-memory store with one stored connection
    /// encrypted under `user`'s key.
    async fn fixture(behavior: StubBehavior) -> Fixture {
        let store = GatewayStore::in_memory().await.unwrap();
        let vault = Arc::new(CredentialVault::new("test-salt"));

        let mut registry = crate::engine::registry::EngineRegistry::new();
        registry.register_executor(Arc::new(StubExecutor { behavior }));

        let user = Uuid::new_v4();
        let descriptor = ConnectionDescriptor::server(
            EngineType::PostgreSQL,
            "localhost".to_string(),
            5432,
            "app".to_string(),
            "secret".to_string(),
            "shop".to_string(),
        );
        let key = vault.derive_key(&user);
        let payload = vault.encrypt(&descriptor, &key).unwrap();
        let record = ConnectionRecord::new(user, payload);
        store.connections().create(&record).await.unwrap();

        Fixture {
            coordinator: QueryCoordinator::new(store, vault, Arc::new(registry)),
            user,
            connection_id: record.id,
        }
    }

    #[test]
    fn successful_run_returns_envelope_and_records_history() {
        smol::block_on(async {
            let f = fixture(StubBehavior::OneRow).await;

            let envelope = f
                .coordinator
                .run(&f.user, &f.connection_id, "SELECT 1")
                .await
                .unwrap();
            assert_eq!(envelope.metadata.row_count, 1);
            assert_eq!(envelope.metadata.affected_rows, 0);
            assert_eq!(envelope.rows[0].get("?column?"), Some(&Value::Int32(1)));

            let history = f.coordinator.history(&f.user).await.unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].status, HistoryStatus::Success);
            assert_eq!(history[0].query, "SELECT 1");
            assert_eq!(history[0].db_name, "shop");
            assert_eq!(history[0].rows, 1);
        });
    }

    #[test]
    fn failed_run_still_records_exactly_one_entry() {
        smol::block_on(async {
            let f = fixture(StubBehavior::Fail).await;

            let err = f
                .coordinator
                .run(&f.user, &f.connection_id, "SELEC 1")
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Execution(_)));

            let history = f.coordinator.history(&f.user).await.unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].status, HistoryStatus::Failed);
            assert!(history[0].error.as_deref().unwrap().contains("syntax error"));
        });
    }

    #[test]
    fn timeout_is_recorded_as_failure() {
        smol::block_on(async {
            let f = fixture(StubBehavior::TimeOut).await;

            let err = f
                .coordinator
                .run(&f.user, &f.connection_id, "SELECT pg_sleep(60)")
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Timeout(_)));

            let history = f.coordinator.history(&f.user).await.unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].status, HistoryStatus::Failed);
        });
    }

    #[test]
    fn unknown_connection_leaves_no_history() {
        smol::block_on(async {
            let f = fixture(StubBehavior::OneRow).await;

            let err = f
                .coordinator
                .run(&f.user, &Uuid::new_v4(), "SELECT 1")
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::NotFound));
            assert!(f.coordinator.history(&f.user).await.unwrap().is_empty());
        });
    }

    #[test]
    fn foreign_ciphertext_fails_decryption_without_history() {
        smol::block_on(async {
            // A record whose payload was encrypted under another user's key.
            let store = GatewayStore::in_memory().await.unwrap();
            let vault = Arc::new(CredentialVault::new("test-salt"));

            let mut registry = crate::engine::registry::EngineRegistry::new();
            registry.register_executor(Arc::new(StubExecutor { behavior: StubBehavior::OneRow }));

            let owner = Uuid::new_v4();
            let reader = Uuid::new_v4();
            let descriptor = ConnectionDescriptor::server(
                EngineType::PostgreSQL,
                "localhost".to_string(),
                5432,
                "app".to_string(),
                "secret".to_string(),
                "shop".to_string(),
            );
            let owner_key = vault.derive_key(&owner);
            let payload = vault.encrypt(&descriptor, &owner_key).unwrap();
            let record = ConnectionRecord::new(reader, payload);
            store.connections().create(&record).await.unwrap();

            let coordinator = QueryCoordinator::new(store, vault, Arc::new(registry));
            let err = coordinator.run(&reader, &record.id, "SELECT 1").await.unwrap_err();
            assert!(matches!(err, GatewayError::Decryption(_)));
            assert!(coordinator.history(&reader).await.unwrap().is_empty());
        });
    }

    #[test]
    fn unregistered_engine_records_failure() {
        smol::block_on(async {
            let store = GatewayStore::in_memory().await.unwrap();
            let vault = Arc::new(CredentialVault::new("test-salt"));
            let registry = crate::engine::registry::EngineRegistry::new();

            let user = Uuid::new_v4();
            let descriptor = ConnectionDescriptor::server(
                EngineType::PostgreSQL,
                "localhost".to_string(),
                5432,
                "app".to_string(),
                "secret".to_string(),
                "shop".to_string(),
            );
            let key = vault.derive_key(&user);
            let payload = vault.encrypt(&descriptor, &key).unwrap();
            let record = ConnectionRecord::new(user, payload);
            store.connections().create(&record).await.unwrap();

            let coordinator = QueryCoordinator::new(store, vault, Arc::new(registry));
            let err = coordinator.run(&user, &record.id, "SELECT 1").await.unwrap_err();
            assert!(matches!(err, GatewayError::UnsupportedEngine(EngineType::PostgreSQL)));

            let history = coordinator.history(&user).await.unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].status, HistoryStatus::Failed);
        });
    }
}
