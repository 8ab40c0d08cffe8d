//! Error types for the dockgraph-sync crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Graph error: {0}")]
    Graph(#[from] dockgraph_graph::GraphError),

    #[error("Config error: {0}")]
    Config(String),
}

/// Why an event could not be turned into an entity record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("event has no actor identifier")]
    MissingActor,

    #[error("actor identifier `{id}` is shorter than {required} characters")]
    ShortIdentifier { id: String, required: usize },

    #[error("network event carries no network summary")]
    MissingNetworkSummary,
}

pub type Result<T> = std::result::Result<T, SyncError>;
