//! The transactional graph store seam.
//!
//! The sync loop only needs three call shapes from the store: install a
//! schema, drop everything, and commit a single mutation. [`GraphClient`]
//! implements them against Neo4j; tests substitute recording stores.

use async_trait::async_trait;
use serde_json::{Map, Value};

use dockgraph_core::{Entity, EntityKind};

use crate::client::{GraphClient, GraphError};
use crate::schema::SchemaDefinition;

/// A JSON-encoded record, committed as one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub kind: EntityKind,
    pub id: String,
    /// Sparse property map; never contains empty strings.
    pub properties: Map<String, Value>,
}

impl Mutation {
    /// Build a mutation from an entity record.
    ///
    /// Rejects records whose identifier is empty.
    pub fn from_entity(entity: &Entity) -> Result<Self, GraphError> {
        if entity.id().is_empty() {
            return Err(GraphError::InvalidMutation(format!(
                "{} record without an id",
                entity.kind()
            )));
        }

        let properties = match entity.to_properties() {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(GraphError::Serialization(format!(
                    "expected a JSON object, got {other}"
                )))
            }
            Err(e) => return Err(GraphError::Serialization(e.to_string())),
        };

        Ok(Self {
            kind: entity.kind(),
            id: entity.id().to_string(),
            properties,
        })
    }

    /// The JSON payload as sent to the store.
    pub fn to_json(&self) -> String {
        Value::Object(self.properties.clone()).to_string()
    }
}

/// Operations the graph writer issues against the store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Install (or re-install) the predicate schema for one entity kind.
    async fn alter_schema(&self, schema: &SchemaDefinition) -> Result<(), GraphError>;

    /// Destroy every stored node and every schema index.
    async fn drop_all(&self) -> Result<(), GraphError>;

    /// Commit a single upsert immediately.
    async fn mutate(&self, mutation: &Mutation) -> Result<(), GraphError>;
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn alter_schema(&self, schema: &SchemaDefinition) -> Result<(), GraphError> {
        self.apply_schema(schema).await
    }

    async fn drop_all(&self) -> Result<(), GraphError> {
        self.drop_everything().await
    }

    async fn mutate(&self, mutation: &Mutation) -> Result<(), GraphError> {
        self.commit_mutation(mutation).await
    }
}
