//! Graph writer: the only component that talks to the graph store.
//!
//! Every call is synchronous from the sync loop's point of view, bounded by
//! a per-call timeout, and retried a fixed number of times on transient
//! failures. There is no queue and no batching; a call that still fails is
//! logged and returned to the caller, which drops the event.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use dockgraph_core::Entity;
use dockgraph_graph::{GraphError, GraphStore, Mutation, SchemaDefinition};

/// Timeout and bounded retry for graph store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never zero.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub base_delay: Duration,
    /// Upper bound for one attempt.
    pub call_timeout: Duration,
}

impl RetryPolicy {
    /// Delay to wait after `attempt` (1-based) failed, with up to 25% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1).min(6));
        let base = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        let jitter = fastrand::u64(0..=base / 4);
        Duration::from_millis(base + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// The store as observed by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    SchemaPresent,
}

/// Owns the graph store handle and orders every write.
pub struct GraphWriter<S> {
    store: S,
    policy: RetryPolicy,
    state: StoreState,
}

impl<S: GraphStore> GraphWriter<S> {
    pub fn new(store: S, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            state: StoreState::Uninitialized,
        }
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Drop every node and all schema.
    pub async fn reset(&mut self) -> Result<(), GraphError> {
        let store = &self.store;
        match with_retry(&self.policy, "drop_all", || store.drop_all()).await {
            Ok(()) => {
                self.state = StoreState::SchemaPresent;
                tracing::info!("Graph reset");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Graph reset failed");
                Err(e)
            }
        }
    }

    /// Install a schema definition.
    pub async fn alter_schema(&mut self, schema: &SchemaDefinition) -> Result<(), GraphError> {
        let store = &self.store;
        with_retry(&self.policy, "alter_schema", || store.alter_schema(schema)).await?;
        self.state = StoreState::SchemaPresent;
        Ok(())
    }

    /// Serialize an entity and commit it as one transaction.
    pub async fn upsert(&mut self, entity: &Entity) -> Result<(), GraphError> {
        let mutation = match Mutation::from_entity(entity) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(kind = %entity.kind(), error = %e, "Entity rejected before write");
                return Err(e);
            }
        };

        let store = &self.store;
        match with_retry(&self.policy, "mutate", || store.mutate(&mutation)).await {
            Ok(()) => {
                tracing::info!(
                    kind = %mutation.kind,
                    id = %mutation.id,
                    payload = %mutation.to_json(),
                    "Entity upserted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    kind = %mutation.kind,
                    id = %mutation.id,
                    error = %e,
                    "Upsert failed"
                );
                Err(e)
            }
        }
    }
}

/// Run a store call under the policy's timeout, retrying transient errors.
async fn with_retry<F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> Result<(), GraphError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), GraphError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = match timeout(policy.call_timeout, call()).await {
            Ok(r) => r,
            Err(_) => Err(GraphError::Timeout {
                operation: operation.to_string(),
                millis: policy.call_timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Graph store call failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast_policy, RecordingStore, StoreCall};
    use dockgraph_core::{Container, EntityKind};
    use dockgraph_graph::SchemaCatalog;

    fn web1() -> Entity {
        Entity::from(Container {
            id: "abcdef123456".to_string(),
            name: "web1".to_string(),
            image: "nginx:latest".to_string(),
        })
    }

    #[test]
    fn test_backoff_grows() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            ..Default::default()
        };
        let first = policy.backoff(1);
        let third = policy.backoff(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_upsert_issues_one_mutation() {
        let store = RecordingStore::default();
        let mut writer = GraphWriter::new(store.clone(), fast_policy());

        writer.upsert(&web1()).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            StoreCall::Mutate(m) => {
                assert_eq!(m.kind, EntityKind::Container);
                assert_eq!(m.id, "abcdef123456");
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let store = RecordingStore::default();
        store.fail_next(1);
        let mut writer = GraphWriter::new(store.clone(), fast_policy());

        writer.upsert(&web1()).await.unwrap();

        assert_eq!(store.mutations().len(), 2);
        assert_eq!(store.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_failure_gives_up() {
        let store = RecordingStore::default();
        store.fail_next(10);
        let mut writer = GraphWriter::new(store.clone(), fast_policy());

        let err = writer.upsert(&web1()).await.unwrap_err();
        assert!(matches!(err, GraphError::Connection(_)));
        assert_eq!(store.mutations().len(), fast_policy().max_attempts as usize);
        assert!(store.committed().is_empty());
    }

    #[tokio::test]
    async fn test_hung_call_times_out() {
        let store = RecordingStore::default();
        store.hang_for(Duration::from_millis(500));
        let policy = RetryPolicy {
            max_attempts: 1,
            call_timeout: Duration::from_millis(20),
            ..fast_policy()
        };
        let mut writer = GraphWriter::new(store.clone(), policy);

        let err = writer.upsert(&web1()).await.unwrap_err();
        assert!(matches!(err, GraphError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_invalid_entity_is_not_sent() {
        let store = RecordingStore::default();
        let mut writer = GraphWriter::new(store.clone(), fast_policy());

        let err = writer
            .upsert(&Entity::from(Container::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidMutation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let store = RecordingStore::default();
        let mut writer = GraphWriter::new(store.clone(), fast_policy());
        assert_eq!(writer.state(), StoreState::Uninitialized);

        let catalog = SchemaCatalog::default();
        writer
            .alter_schema(catalog.get(EntityKind::Container).unwrap())
            .await
            .unwrap();
        assert_eq!(writer.state(), StoreState::SchemaPresent);

        writer.upsert(&web1()).await.unwrap();
        assert_eq!(writer.state(), StoreState::SchemaPresent);
    }

    #[tokio::test]
    async fn test_reset_reaches_schema_present() {
        let store = RecordingStore::default();
        let mut writer = GraphWriter::new(store.clone(), fast_policy());

        writer.reset().await.unwrap();
        assert_eq!(writer.state(), StoreState::SchemaPresent);
        assert_eq!(store.calls(), vec![StoreCall::DropAll]);
    }
}
