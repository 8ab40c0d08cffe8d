//! Lifecycle event classification.
//!
//! Decides which transitions warrant a graph mutation. Classification is
//! pure; logging of ignored events is left to the caller via
//! [`IgnoreReason::is_logged`].

use dockgraph_core::EntityKind;

/// What the sync loop should do with a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Materialize the entity in the graph.
    Create,
    /// Observed, but not persisted.
    Update,
    /// Observed, but never deleted from the graph.
    Remove,
    Ignore(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `exec_*` sub-process lifecycle noise.
    ExecNoise,
    /// State replayed for a container that is already running.
    AlreadyRunning,
    /// The event names no actor; it must not reach the mapper.
    MissingActor,
    /// An action with no handling for this domain.
    Unhandled,
}

impl IgnoreReason {
    /// Whether the ignored event should leave a log line.
    pub fn is_logged(&self) -> bool {
        matches!(self, IgnoreReason::MissingActor | IgnoreReason::Unhandled)
    }
}

/// Classify a lifecycle event by domain, action, and actor identifier.
pub fn classify(domain: EntityKind, action: &str, actor_id: &str) -> Classification {
    match domain {
        EntityKind::Container => classify_container(action, actor_id),
        EntityKind::Network => classify_network(action, actor_id),
        EntityKind::Node => Classification::Ignore(IgnoreReason::Unhandled),
    }
}

fn classify_container(action: &str, actor_id: &str) -> Classification {
    match action {
        "exec_create" | "exec_start" | "exec_die" => Classification::Ignore(IgnoreReason::ExecNoise),
        _ if actor_id.is_empty() => Classification::Ignore(IgnoreReason::MissingActor),
        "start" => Classification::Create,
        // TODO: check whether the container is already in the graph and
        // catch up if it is not.
        "running" => Classification::Ignore(IgnoreReason::AlreadyRunning),
        _ => Classification::Ignore(IgnoreReason::Unhandled),
    }
}

fn classify_network(action: &str, actor_id: &str) -> Classification {
    if actor_id.is_empty() {
        return Classification::Ignore(IgnoreReason::MissingActor);
    }
    match action {
        "create" => Classification::Create,
        "update" => Classification::Update,
        "remove" => Classification::Remove,
        _ => Classification::Ignore(IgnoreReason::Unhandled),
    }
}
