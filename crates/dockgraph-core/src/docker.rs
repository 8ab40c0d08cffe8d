//! Docker engine event wire format.
//!
//! Matches the JSON emitted by `docker events --format '{{json .}}'` and
//! converts it into bus messages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::events::{Actor, BusMessage, LifecycleEvent, NetworkSummary};
use crate::types::EntityKind;

/// A raw engine event.
#[derive(Debug, Clone, Deserialize)]
pub struct DockerEventMessage {
    #[serde(rename = "Type")]
    pub typ: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Actor", default)]
    pub actor: DockerActor,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub time: i64,
    #[serde(rename = "timeNano", default)]
    pub time_nano: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerActor {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Attributes", default)]
    pub attributes: HashMap<String, String>,
}

impl DockerEventMessage {
    pub fn timestamp(&self) -> DateTime<Utc> {
        let parsed = if self.time_nano > 0 {
            DateTime::from_timestamp(
                self.time_nano.div_euclid(1_000_000_000),
                self.time_nano.rem_euclid(1_000_000_000) as u32,
            )
        } else {
            DateTime::from_timestamp(self.time, 0)
        };
        parsed.unwrap_or_else(Utc::now)
    }

    /// Convert into a bus message.
    ///
    /// Network events carry a summary built from the actor: its id, the
    /// `name` attribute, the `type` attribute as driver, and the event scope.
    pub fn into_bus_message(self) -> BusMessage {
        let time = self.timestamp();
        let domain = match self.typ.as_str() {
            "container" => EntityKind::Container,
            "network" => EntityKind::Network,
            _ => {
                return BusMessage::Unrecognized {
                    kind: format!("docker.{}", self.typ),
                    payload: serde_json::json!({
                        "action": self.action,
                        "actor_id": self.actor.id,
                    }),
                }
            }
        };

        let actor = Actor {
            id: self.actor.id,
            attributes: self.actor.attributes,
        };
        let event = LifecycleEvent {
            domain,
            action: self.action,
            actor,
            scope: self.scope,
            time,
        };

        match domain {
            EntityKind::Network => {
                let network = NetworkSummary {
                    id: event.actor.id.clone(),
                    name: event.actor.attribute("name").to_string(),
                    driver: event.actor.attribute("type").to_string(),
                    scope: event.scope.clone(),
                };
                BusMessage::Network {
                    event,
                    network: Some(network),
                }
            }
            _ => BusMessage::Container { event },
        }
    }
}
