//! Configuration for the dockgraph synchronizer.

use std::time::Duration;

use serde::Deserialize;

use dockgraph_graph::GraphConfig;

use crate::error::{Result, SyncError};
use crate::writer::RetryPolicy;

/// Sync loop configuration.
///
/// Loaded from the `[sync]` section of `dockgraph.toml` or
/// `DOCKGRAPH__SYNC__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Name this handler appears under in message source paths.
    #[serde(default = "default_handler_name")]
    pub handler_name: String,

    /// Components whose log messages this handler accepts (empty: all).
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Drop every node and index before serving events.
    #[serde(default)]
    pub reset_on_start: bool,

    /// Upper bound for a single graph store call, in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Total attempts per graph store call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Capacity of the in-process event bus.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl SyncConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.backoff_base_ms),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }
}

fn default_handler_name() -> String {
    "dockgraph".to_string()
}

fn default_call_timeout_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_bus_capacity() -> usize {
    1024
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            handler_name: default_handler_name(),
            inputs: Vec::new(),
            reset_on_start: false,
            call_timeout_ms: default_call_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

/// Everything the binary reads at startup.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub neo4j: GraphConfig,
    pub sync: SyncConfig,
}

impl Settings {
    /// Load from `<file_prefix>.{toml,json,...}` (optional) overlaid with
    /// `DOCKGRAPH__*` environment variables. Missing sections fall back to
    /// defaults.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("DOCKGRAPH")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("sync.inputs")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let neo4j = match cfg.get::<GraphConfig>("neo4j") {
            Ok(c) => c,
            Err(config::ConfigError::NotFound(_)) => GraphConfig::default(),
            Err(e) => return Err(SyncError::Config(e.to_string())),
        };
        let sync = match cfg.get::<SyncConfig>("sync") {
            Ok(c) => c,
            Err(config::ConfigError::NotFound(_)) => SyncConfig::default(),
            Err(e) => return Err(SyncError::Config(e.to_string())),
        };

        if sync.bus_capacity == 0 {
            return Err(SyncError::Config(
                "sync.bus_capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self { neo4j, sync })
    }
}
