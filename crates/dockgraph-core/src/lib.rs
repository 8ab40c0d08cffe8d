//! dockgraph-core: Shared types for the dockgraph synchronizer.
//!
//! This crate provides the foundational types used across dockgraph crates:
//! - Entity records (Container, Network, Node) projected into the graph
//! - Bus message types consumed by the sync loop
//! - The Docker engine event wire format
//! - Common error types

pub mod docker;
pub mod error;
pub mod events;
pub mod types;

pub use error::CoreError;
pub use events::{
    Actor, BusMessage, EngineInfo, InventoryRequest, LifecycleEvent, LogMessage, NetworkSummary,
};
pub use types::{Container, Entity, EntityKind, Network, SwarmNode};
