//! dockgraph-graph: Neo4j client for the container graph.
//!
//! This crate is the single mutation point for the graph store. Schema
//! installation, drop-all, and committed upserts all flow through the
//! [`GraphStore`] trait, which [`GraphClient`] implements.

pub mod client;
pub mod mutations;
pub mod schema;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use schema::{SchemaCatalog, SchemaDefinition};
pub use store::{GraphStore, Mutation};
