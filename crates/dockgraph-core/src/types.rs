//! Entity records projected into the graph.
//!
//! Every record serializes sparsely: empty string fields are omitted rather
//! than written as explicit empty properties.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Entity Kind ───────────────────────────────────────────────────

/// The domain an event or record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Container,
    Network,
    Node,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Container, EntityKind::Network, EntityKind::Node];

    /// The tag used for schema lookup and in event payloads.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Network => "network",
            Self::Node => "node",
        }
    }

    /// The graph label nodes of this kind are stored under.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Container => "Container",
            Self::Network => "Network",
            Self::Node => "SwarmNode",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ── Records ───────────────────────────────────────────────────────

/// A container, keyed by its 12-character short identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

/// A network as reported by the engine's network summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub driver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

/// A swarm node. The schema is registered but nothing writes these yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwarmNode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub availability: String,
    #[serde(
        rename = "manager-status",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub manager_status: String,
}

/// Enum wrapper for every record the writer can upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "entity_type", rename_all = "lowercase")]
pub enum Entity {
    Container(Container),
    Network(Network),
    Node(SwarmNode),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Container(_) => EntityKind::Container,
            Entity::Network(_) => EntityKind::Network,
            Entity::Node(_) => EntityKind::Node,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Container(c) => &c.id,
            Entity::Network(n) => &n.id,
            Entity::Node(n) => &n.id,
        }
    }

    /// Serialize the record itself (without the `entity_type` tag).
    pub fn to_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Entity::Container(c) => serde_json::to_value(c),
            Entity::Network(n) => serde_json::to_value(n),
            Entity::Node(n) => serde_json::to_value(n),
        }
    }
}

impl From<Container> for Entity {
    fn from(c: Container) -> Self {
        Entity::Container(c)
    }
}

impl From<Network> for Entity {
    fn from(n: Network) -> Self {
        Entity::Network(n)
    }
}

impl From<SwarmNode> for Entity {
    fn from(n: SwarmNode) -> Self {
        Entity::Node(n)
    }
}
