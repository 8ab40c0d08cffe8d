//! Write operations for the graph.
//!
//! Upserts MERGE on the entity id and then replace the node's whole
//! property map, so a re-created entity overwrites the previous record
//! instead of being patched field by field.

use neo4rs::query;
use serde_json::Value;

use crate::client::{GraphClient, GraphError};
use crate::schema::{quote_property, SchemaDefinition};
use crate::store::Mutation;

impl GraphClient {
    // ── Schema ───────────────────────────────────────────────────

    /// Install every index of a schema definition.
    pub async fn apply_schema(&self, schema: &SchemaDefinition) -> Result<(), GraphError> {
        for stmt in schema.statements() {
            self.run(query(&stmt)).await?;
        }
        tracing::debug!(kind = %schema.kind, "Schema applied");
        Ok(())
    }

    /// Drop all nodes, constraints, and indexes.
    pub async fn drop_everything(&self) -> Result<(), GraphError> {
        self.run(query("MATCH (n) DETACH DELETE n")).await?;

        // Constraints own their backing indexes, so they go first.
        let constraints = self
            .names(query("SHOW CONSTRAINTS YIELD name RETURN name"), "name")
            .await?;
        for name in constraints {
            self.run(query(&format!(
                "DROP CONSTRAINT {} IF EXISTS",
                quote_property(&name)
            )))
            .await?;
        }

        let indexes = self
            .names(
                query("SHOW INDEXES YIELD name, type WHERE type <> 'LOOKUP' RETURN name"),
                "name",
            )
            .await?;
        let dropped = indexes.len();
        for name in indexes {
            self.run(query(&format!("DROP INDEX {} IF EXISTS", quote_property(&name))))
                .await?;
        }

        tracing::info!(indexes_dropped = dropped, "Graph dropped");
        Ok(())
    }

    // ── Upserts ──────────────────────────────────────────────────

    /// Commit a single mutation in its own transaction.
    pub async fn commit_mutation(&self, mutation: &Mutation) -> Result<(), GraphError> {
        let (cypher, params) = upsert_cypher(mutation);

        let mut q = query(&cypher).param("id", mutation.id.clone());
        for (name, value) in params {
            q = q.param(&name, value);
        }

        let mut txn = self.begin().await?;
        txn.run(q).await?;
        txn.commit().await?;
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Render the MERGE statement for a mutation and its property parameters.
///
/// Property names come from the record types, not from event data; values
/// are always bound as parameters.
pub(crate) fn upsert_cypher(mutation: &Mutation) -> (String, Vec<(String, String)>) {
    let mut assignments = Vec::with_capacity(mutation.properties.len());
    let mut params = Vec::with_capacity(mutation.properties.len());

    let mut entries: Vec<_> = mutation.properties.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (i, (key, value)) in entries.into_iter().enumerate() {
        let param = format!("p{i}");
        assignments.push(format!("{}: ${param}", quote_property(key)));
        params.push((param, value_to_string(value)));
    }

    let cypher = format!(
        "MERGE (n:{label} {{id: $id}})
         SET n = {{{props}}}",
        label = mutation.kind.label(),
        props = assignments.join(", ")
    );

    (cypher, params)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockgraph_core::{Entity, SwarmNode};

    #[test]
    fn test_upsert_cypher_binds_every_property() {
        let entity = Entity::from(SwarmNode {
            id: "node-1".to_string(),
            name: "manager-a".to_string(),
            manager_status: "Leader".to_string(),
            ..Default::default()
        });
        let m = Mutation::from_entity(&entity).unwrap();

        let (cypher, params) = upsert_cypher(&m);
        assert!(cypher.starts_with("MERGE (n:SwarmNode {id: $id})"));
        assert!(cypher.contains("SET n = {id: $p0, `manager-status`: $p1, name: $p2}"));
        assert_eq!(
            params,
            vec![
                ("p0".to_string(), "node-1".to_string()),
                ("p1".to_string(), "Leader".to_string()),
                ("p2".to_string(), "manager-a".to_string()),
            ]
        );
    }

    #[test]
    fn test_event_data_never_reaches_cypher_text() {
        let entity = Entity::from(dockgraph_core::Container {
            id: "abcdef123456".to_string(),
            name: "x}) DETACH DELETE n //".to_string(),
            image: String::new(),
        });
        let m = Mutation::from_entity(&entity).unwrap();

        let (cypher, _) = upsert_cypher(&m);
        assert!(!cypher.contains("DETACH"));
    }
}
