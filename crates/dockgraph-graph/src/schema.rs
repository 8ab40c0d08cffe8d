//! Predicate schema per entity kind.
//!
//! Every predicate gets a TEXT index so nodes can be looked up by term.
//! Statements use `IF NOT EXISTS`, so applying a definition twice leaves
//! the store exactly as applying it once.

use std::collections::HashMap;

use dockgraph_core::EntityKind;

/// The indexed predicate set for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub kind: EntityKind,
    pub predicates: Vec<&'static str>,
}

impl SchemaDefinition {
    pub fn new(kind: EntityKind, predicates: &[&'static str]) -> Self {
        Self {
            kind,
            predicates: predicates.to_vec(),
        }
    }

    /// Cypher statements that install this definition.
    pub fn statements(&self) -> Vec<String> {
        let label = self.kind.label();
        self.predicates
            .iter()
            .map(|predicate| {
                format!(
                    "CREATE TEXT INDEX {} IF NOT EXISTS FOR (n:{label}) ON (n.{})",
                    index_name(self.kind, predicate),
                    quote_property(predicate)
                )
            })
            .collect()
    }
}

/// Schema definitions for every entity kind.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    definitions: HashMap<EntityKind, SchemaDefinition>,
}

impl SchemaCatalog {
    pub fn get(&self, kind: EntityKind) -> Option<&SchemaDefinition> {
        self.definitions.get(&kind)
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        let definitions = [
            SchemaDefinition::new(EntityKind::Container, &["id", "name", "image"]),
            SchemaDefinition::new(EntityKind::Network, &["id", "name", "driver", "scope"]),
            SchemaDefinition::new(
                EntityKind::Node,
                &["id", "name", "status", "availability", "manager-status"],
            ),
        ]
        .into_iter()
        .map(|def| (def.kind, def))
        .collect();

        Self { definitions }
    }
}

fn index_name(kind: EntityKind, predicate: &str) -> String {
    format!("{}_{}_text", kind.tag(), predicate.replace('-', "_"))
}

/// Backtick-quote a property name unless it is a plain identifier.
pub(crate) fn quote_property(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}
