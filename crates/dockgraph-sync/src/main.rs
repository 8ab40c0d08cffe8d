//! CLI entry point for the dockgraph synchronizer.
//!
//! Reads bus messages (or raw docker engine events) as JSON lines from
//! stdin and projects them into Neo4j.

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use dockgraph_sync::config::Settings;
use dockgraph_sync::feed::feed_lines;
use dockgraph_sync::sync_loop::connect_and_run;

#[derive(Parser)]
#[command(name = "dockgraph-sync")]
#[command(about = "Project docker lifecycle events into a Neo4j graph")]
struct Cli {
    /// Config file prefix (default: dockgraph).
    #[arg(short, long, default_value = "dockgraph")]
    config: String,

    /// Drop the whole graph before serving events.
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;
    if cli.reset {
        settings.sync.reset_on_start = true;
    }

    let capacity = settings.sync.bus_capacity;
    let (tx, rx) = broadcast::channel(capacity);

    let mut sync = tokio::spawn(async move { connect_and_run(&settings, rx).await });

    std::thread::spawn(move || {
        let stats = feed_lines(std::io::stdin().lock(), &tx, capacity);
        tracing::info!(
            lines = stats.lines,
            published = stats.published,
            rejected = stats.rejected,
            "Input exhausted"
        );
    });

    tokio::select! {
        res = &mut sync => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping without draining the bus");
            sync.abort();
        }
    }

    Ok(())
}
