//! dockgraph-sync: Docker lifecycle events → Neo4j graph.
//!
//! Classifies container and network events, maps them to typed records,
//! registers the predicate schema, and upserts through a single writer.

pub mod classify;
pub mod config;
pub mod error;
pub mod feed;
pub mod mapper;
pub mod registrar;
pub mod sync_loop;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{MappingError, SyncError};
pub use sync_loop::{SyncLoop, SyncStats};
pub use writer::{GraphWriter, RetryPolicy, StoreState};
