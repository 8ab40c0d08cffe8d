//! Bus message types consumed by the sync loop.
//!
//! The bus carries a discriminated stream of payloads. Each line on the
//! wire is a JSON object tagged by `kind`; raw Docker engine events (no
//! `kind`, but `Type`/`Action`) are accepted as well and converted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::docker::DockerEventMessage;
use crate::error::{CoreError, Result};
use crate::types::EntityKind;

const KNOWN_KINDS: [&str; 5] = ["log", "inventory_request", "container", "network", "engine"];

/// A payload delivered on the bus, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusMessage {
    /// A generic log or control message from another component.
    Log(LogMessage),
    /// A query against the container inventory. Answered by another consumer.
    InventoryRequest(InventoryRequest),
    /// A container lifecycle transition.
    Container { event: LifecycleEvent },
    /// A network lifecycle transition, with the engine's network summary.
    Network {
        event: LifecycleEvent,
        #[serde(default)]
        network: Option<NetworkSummary>,
    },
    /// Connectivity information about the engine the producer talks to.
    Engine { engine: EngineInfo },
    /// Anything else. Only produced by [`BusMessage::decode`].
    #[serde(skip)]
    Unrecognized {
        kind: String,
        payload: serde_json::Value,
    },
}

impl BusMessage {
    /// Decode one wire line into a bus message.
    ///
    /// Unknown `kind` tags become [`BusMessage::Unrecognized`]; a known tag
    /// with a bad body is an error.
    pub fn decode(line: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(line)?;

        if let Some(kind) = value.get("kind").and_then(|k| k.as_str()) {
            if KNOWN_KINDS.contains(&kind) {
                return Ok(serde_json::from_value(value)?);
            }
            return Ok(BusMessage::Unrecognized {
                kind: kind.to_string(),
                payload: value,
            });
        }

        if value.get("Type").is_some() && value.get("Action").is_some() {
            let raw: DockerEventMessage = serde_json::from_value(value)?;
            return Ok(raw.into_bus_message());
        }

        Err(CoreError::Malformed(
            "expected a `kind` tag or a docker event".to_string(),
        ))
    }

    /// Short name of the payload kind, for logging.
    pub fn kind_name(&self) -> &str {
        match self {
            BusMessage::Log(_) => "log",
            BusMessage::InventoryRequest(_) => "inventory_request",
            BusMessage::Container { .. } => "container",
            BusMessage::Network { .. } => "network",
            BusMessage::Engine { .. } => "engine",
            BusMessage::Unrecognized { kind, .. } => kind.as_str(),
        }
    }
}

/// A log/control message travelling between components.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogMessage {
    /// Components the message passed through, oldest first.
    #[serde(default)]
    pub source_path: Vec<String>,
    #[serde(default)]
    pub msg: String,
    /// Host-wide circuit breaker: no handler should process this message.
    #[serde(default)]
    pub stop_processing: bool,
}

impl LogMessage {
    /// Whether `handler` must skip this message.
    ///
    /// True when the circuit breaker is set, when the handler already saw
    /// the message, or when `inputs` is non-empty and the message's origin
    /// is not listed in it.
    pub fn stops_processing(&self, handler: &str, inputs: &[String]) -> bool {
        if self.stop_processing {
            return true;
        }
        if self.source_path.iter().any(|s| s == handler) {
            return true;
        }
        match self.source_path.last() {
            Some(source) if !inputs.is_empty() => !inputs.iter().any(|i| i == source),
            None => !inputs.is_empty(),
            _ => false,
        }
    }
}

/// A container inventory lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// The engine a producer is connected to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server_version: String,
}

/// The object a lifecycle event is about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Actor {
    /// Attribute value, or `""` when absent.
    pub fn attribute(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }
}

/// A lifecycle transition for a container, network, or node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub domain: EntityKind,
    pub action: String,
    #[serde(default)]
    pub actor: Actor,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(domain: EntityKind, action: &str, actor: Actor) -> Self {
        Self {
            domain,
            action: action.to_string(),
            actor,
            scope: String::new(),
            time: Utc::now(),
        }
    }
}

/// The engine's summary of a network, shipped with network events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub scope: String,
}
