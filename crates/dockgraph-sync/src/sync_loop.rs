//! The sync loop: bus → classify → map → register schema → upsert.
//!
//! Runs on a single task. The blocking receive is the only idle suspension
//! point; every graph call runs inline on the same task, so writes reach
//! the store strictly in delivery order.

use tokio::sync::broadcast::{self, error::RecvError};

use dockgraph_core::{BusMessage, Entity, EntityKind, LifecycleEvent, LogMessage, NetworkSummary};
use dockgraph_graph::{GraphClient, GraphStore};

use crate::classify::{classify, Classification, IgnoreReason};
use crate::config::{Settings, SyncConfig};
use crate::error::Result;
use crate::mapper::{map_container, map_network, short_id};
use crate::registrar::SchemaRegistrar;
use crate::writer::GraphWriter;

/// Counters kept over the life of the loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub received: u64,
    pub upserts: u64,
    pub write_failures: u64,
    pub schema_failures: u64,
    pub malformed: u64,
    pub observed: u64,
    pub ignored: u64,
    pub lagged: u64,
}

pub struct SyncLoop<S> {
    writer: GraphWriter<S>,
    registrar: SchemaRegistrar,
    config: SyncConfig,
    stats: SyncStats,
}

impl<S: GraphStore> SyncLoop<S> {
    pub fn new(writer: GraphWriter<S>, config: SyncConfig) -> Self {
        Self {
            writer,
            registrar: SchemaRegistrar::default(),
            config,
            stats: SyncStats::default(),
        }
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Serve the bus until every sender is gone.
    ///
    /// Resets the graph first when configured. Returns the final counters;
    /// the writer (and with it the store handle) is dropped on return.
    pub async fn run(mut self, mut rx: broadcast::Receiver<BusMessage>) -> SyncStats {
        tracing::info!(
            handler = %self.config.handler_name,
            version = env!("CARGO_PKG_VERSION"),
            "Starting dockgraph handler"
        );

        if self.config.reset_on_start && self.writer.reset().await.is_ok() {
            self.registrar.forget_all();
        }

        loop {
            match rx.recv().await {
                Ok(msg) => self.handle(msg).await,
                Err(RecvError::Lagged(skipped)) => {
                    self.stats.lagged += skipped;
                    tracing::warn!(skipped, "Bus receiver lagged, messages lost");
                }
                Err(RecvError::Closed) => break,
            }
        }

        let stats = self.stats;
        tracing::info!(
            received = stats.received,
            upserts = stats.upserts,
            write_failures = stats.write_failures,
            schema_failures = stats.schema_failures,
            malformed = stats.malformed,
            observed = stats.observed,
            ignored = stats.ignored,
            lagged = stats.lagged,
            "Bus closed, sync loop stopped"
        );
        stats
    }

    /// Process a single bus message.
    pub async fn handle(&mut self, msg: BusMessage) {
        self.stats.received += 1;

        match msg {
            BusMessage::Log(log) => self.handle_log(&log),
            BusMessage::InventoryRequest(_) => {}
            BusMessage::Container { event } => self.handle_container(&event).await,
            BusMessage::Network { event, network } => {
                self.handle_network(&event, network.as_ref()).await
            }
            BusMessage::Engine { engine } => {
                tracing::info!(
                    engine = %engine.name,
                    server_version = %engine.server_version,
                    "Producer connected to engine"
                );
            }
            BusMessage::Unrecognized { kind, payload } => {
                tracing::debug!(kind = %kind, payload = %payload, "Unrecognized bus payload");
            }
        }
    }

    fn handle_log(&self, log: &LogMessage) {
        if log.stops_processing(&self.config.handler_name, &self.config.inputs) {
            return;
        }
        tracing::info!(source = %log.source_path.join("->"), "{}", log.msg);
    }

    async fn handle_container(&mut self, event: &LifecycleEvent) {
        match classify(EntityKind::Container, &event.action, &event.actor.id) {
            Classification::Create => match map_container(event) {
                Ok(cnt) => self.write(Entity::from(cnt)).await,
                Err(e) => self.drop_malformed(EntityKind::Container, event, &e.to_string()),
            },
            Classification::Update | Classification::Remove => self.observe(
                EntityKind::Container,
                event,
                &event.actor.id,
                event.actor.attribute("name"),
            ),
            Classification::Ignore(reason) => self.ignore(EntityKind::Container, event, reason),
        }
    }

    async fn handle_network(&mut self, event: &LifecycleEvent, network: Option<&NetworkSummary>) {
        // The summary only feeds the log fields; the actor gates the event.
        let (id, name) = match network {
            Some(n) if !n.id.is_empty() => (n.id.as_str(), n.name.as_str()),
            _ => (event.actor.id.as_str(), event.actor.attribute("name")),
        };

        match classify(EntityKind::Network, &event.action, &event.actor.id) {
            Classification::Create => match map_network(network) {
                Ok(net) => self.write(Entity::from(net)).await,
                Err(e) => self.drop_malformed(EntityKind::Network, event, &e.to_string()),
            },
            // Updates and removals are observed only; the graph is append-only.
            Classification::Update | Classification::Remove => {
                self.observe(EntityKind::Network, event, id, name)
            }
            Classification::Ignore(reason) => self.ignore(EntityKind::Network, event, reason),
        }
    }

    async fn write(&mut self, entity: Entity) {
        let kind = entity.kind();
        if !self.registrar.ensure_schema(&mut self.writer, kind).await {
            self.stats.schema_failures += 1;
        }

        match self.writer.upsert(&entity).await {
            Ok(()) => self.stats.upserts += 1,
            Err(_) => self.stats.write_failures += 1,
        }
    }

    fn observe(&mut self, kind: EntityKind, event: &LifecycleEvent, id: &str, name: &str) {
        self.stats.observed += 1;
        tracing::info!(
            kind = %kind,
            id = %id,
            action = %event.action,
            name = %name,
            "Lifecycle change observed, graph left unchanged"
        );
    }

    fn ignore(&mut self, kind: EntityKind, event: &LifecycleEvent, reason: IgnoreReason) {
        if reason == IgnoreReason::MissingActor {
            self.drop_malformed(kind, event, "event has no actor identifier");
            return;
        }

        self.stats.ignored += 1;
        if reason.is_logged() {
            tracing::info!(
                kind = %kind,
                action = %event.action,
                actor = %short_id(&event.actor.id),
                name = %event.actor.attribute("name"),
                "Lifecycle event ignored"
            );
        }
    }

    fn drop_malformed(&mut self, kind: EntityKind, event: &LifecycleEvent, reason: &str) {
        self.stats.malformed += 1;
        tracing::warn!(
            kind = %kind,
            action = %event.action,
            actor = %event.actor.id,
            reason = %reason,
            "Dropping malformed event"
        );
    }
}

/// Connect to Neo4j and serve the bus.
///
/// A failed connection is returned immediately; there is no retry.
pub async fn connect_and_run(
    settings: &Settings,
    rx: broadcast::Receiver<BusMessage>,
) -> Result<SyncStats> {
    let client = GraphClient::connect(&settings.neo4j).await?;
    let writer = GraphWriter::new(client, settings.sync.retry_policy());
    Ok(SyncLoop::new(writer, settings.sync.clone()).run(rx).await)
}
