//! Neo4j connection management and shared graph client.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Graph store call `{operation}` timed out after {millis}ms")]
    Timeout { operation: String, millis: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),
}

impl GraphError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GraphError::Connection(_) | GraphError::Query(_) | GraphError::Timeout { .. }
        )
    }
}

/// Configuration for connecting to Neo4j.
///
/// Loaded from the `[neo4j]` section of `dockgraph.toml` or
/// `DOCKGRAPH__NEO4J__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "dockgraph-dev".to_string()
}

fn default_max_connections() -> u32 {
    4
}

fn default_fetch_size() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

/// Neo4j graph client with connection pooling.
///
/// Owned by the graph writer; dropping it releases the pool.
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Run a statement whose result rows are not needed.
    pub async fn run(&self, statement: Query) -> Result<(), GraphError> {
        self.graph.run(statement).await?;
        Ok(())
    }

    /// Collect the `column` string of every row a query returns.
    ///
    /// Used to enumerate schema objects by name before dropping them.
    pub async fn names(&self, statement: Query, column: &str) -> Result<Vec<String>, GraphError> {
        let mut stream = self.graph.execute(statement).await?;
        let mut names = Vec::new();
        while let Some(row) = stream.next().await? {
            if let Ok(name) = row.get::<String>(column) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open an explicit transaction; mutations commit through it.
    pub async fn begin(&self) -> Result<neo4rs::Txn, GraphError> {
        Ok(self.graph.start_txn().await?)
    }
}
