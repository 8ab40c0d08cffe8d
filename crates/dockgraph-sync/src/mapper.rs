//! Event → entity record mapping.

use dockgraph_core::{Container, LifecycleEvent, Network, NetworkSummary};

use crate::error::MappingError;

/// Length of the short container identifier stored in the graph.
pub const SHORT_ID_LEN: usize = 12;

/// Build a container record from a container lifecycle event.
///
/// The id is the first [`SHORT_ID_LEN`] characters of the actor id; `name`
/// and `image` come from the actor attributes and default to empty.
pub fn map_container(event: &LifecycleEvent) -> Result<Container, MappingError> {
    let raw = event.actor.id.as_str();
    if raw.is_empty() {
        return Err(MappingError::MissingActor);
    }
    if raw.chars().count() < SHORT_ID_LEN {
        return Err(MappingError::ShortIdentifier {
            id: raw.to_string(),
            required: SHORT_ID_LEN,
        });
    }

    Ok(Container {
        id: raw.chars().take(SHORT_ID_LEN).collect(),
        name: event.actor.attribute("name").to_string(),
        image: event.actor.attribute("image").to_string(),
    })
}

/// Build a network record from the summary shipped with a network event.
pub fn map_network(summary: Option<&NetworkSummary>) -> Result<Network, MappingError> {
    let summary = summary.ok_or(MappingError::MissingNetworkSummary)?;
    if summary.id.is_empty() {
        return Err(MappingError::MissingActor);
    }

    Ok(Network {
        id: summary.id.clone(),
        name: summary.name.clone(),
        driver: summary.driver.clone(),
        scope: summary.scope.clone(),
    })
}

/// Short form of an identifier for log lines; never panics on short input.
pub fn short_id(raw: &str) -> &str {
    match raw.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
