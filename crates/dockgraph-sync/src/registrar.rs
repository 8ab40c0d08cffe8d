//! Schema registration ahead of typed writes.
//!
//! The definition for a kind is installed before every mutation of that
//! kind. Installation is idempotent on the store side, so repeating it is
//! harmless and keeps the ordering guarantee even after an external wipe.

use std::collections::HashSet;

use dockgraph_core::EntityKind;
use dockgraph_graph::{GraphStore, SchemaCatalog};

use crate::writer::GraphWriter;

pub struct SchemaRegistrar {
    catalog: SchemaCatalog,
    registered: HashSet<EntityKind>,
}

impl SchemaRegistrar {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self {
            catalog,
            registered: HashSet::new(),
        }
    }

    /// Install the schema for `kind`. Returns whether the store accepted it.
    ///
    /// A failure is logged, not propagated: the caller still attempts its
    /// mutation.
    pub async fn ensure_schema<S: GraphStore>(
        &mut self,
        writer: &mut GraphWriter<S>,
        kind: EntityKind,
    ) -> bool {
        let Some(definition) = self.catalog.get(kind) else {
            tracing::error!(kind = %kind, "No schema definition for entity kind");
            return false;
        };

        match writer.alter_schema(definition).await {
            Ok(()) => {
                if self.registered.insert(kind) {
                    tracing::info!(
                        kind = %kind,
                        predicates = ?definition.predicates,
                        "Schema registered"
                    );
                } else {
                    tracing::debug!(kind = %kind, "Schema re-applied");
                }
                true
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Schema registration failed");
                false
            }
        }
    }

    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.registered.contains(&kind)
    }

    /// Forget every registration, e.g. after the graph was dropped.
    pub fn forget_all(&mut self) {
        self.registered.clear();
    }
}

impl Default for SchemaRegistrar {
    fn default() -> Self {
        Self::new(SchemaCatalog::default())
    }
}
