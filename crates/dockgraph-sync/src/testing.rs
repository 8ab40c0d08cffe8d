//! In-memory graph store that records every call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use dockgraph_core::EntityKind;
use dockgraph_graph::{GraphError, GraphStore, Mutation, SchemaDefinition};

use crate::writer::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    AlterSchema(EntityKind),
    DropAll,
    Mutate(Mutation),
}

#[derive(Default)]
struct Inner {
    calls: Vec<StoreCall>,
    committed: Vec<Mutation>,
    failing_mutations: usize,
    failing_schema: bool,
    hang: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingStore {
    /// Fail the next `n` mutations with a transient error.
    pub fn fail_next(&self, n: usize) {
        self.inner.lock().unwrap().failing_mutations = n;
    }

    pub fn fail_schema(&self, fail: bool) {
        self.inner.lock().unwrap().failing_schema = fail;
    }

    /// Make every call sleep before answering.
    pub fn hang_for(&self, d: Duration) {
        self.inner.lock().unwrap().hang = Some(d);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Mutate(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn committed(&self) -> Vec<Mutation> {
        self.inner.lock().unwrap().committed.clone()
    }

    fn hang(&self) -> Option<Duration> {
        self.inner.lock().unwrap().hang
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    async fn alter_schema(&self, schema: &SchemaDefinition) -> Result<(), GraphError> {
        let failing = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(StoreCall::AlterSchema(schema.kind));
            inner.failing_schema
        };
        if let Some(d) = self.hang() {
            tokio::time::sleep(d).await;
        }
        if failing {
            return Err(GraphError::Connection("schema refused".to_string()));
        }
        Ok(())
    }

    async fn drop_all(&self) -> Result<(), GraphError> {
        self.inner.lock().unwrap().calls.push(StoreCall::DropAll);
        if let Some(d) = self.hang() {
            tokio::time::sleep(d).await;
        }
        Ok(())
    }

    async fn mutate(&self, mutation: &Mutation) -> Result<(), GraphError> {
        let fail = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(StoreCall::Mutate(mutation.clone()));
            if inner.failing_mutations > 0 {
                inner.failing_mutations -= 1;
                true
            } else {
                false
            }
        };
        if let Some(d) = self.hang() {
            tokio::time::sleep(d).await;
        }
        if fail {
            return Err(GraphError::Connection("connection reset".to_string()));
        }
        self.inner.lock().unwrap().committed.push(mutation.clone());
        Ok(())
    }
}

/// Retry policy with millisecond backoff for tests.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        call_timeout: Duration::from_secs(1),
    }
}
