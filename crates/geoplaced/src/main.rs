//! geoplaced: the Geoplace placement daemon.
//!
//! Assembles the subsystems into one process:
//! - Gazetteer (builtin table plus optional operator table)
//! - Node inventory and its event loop
//! - Placement algorithm
//! - Scheduler loop
//! - Replay control plane reading cluster events
//!
//! # Usage
//!
//! ```text
//! geoplaced run --config /etc/geoplace/geoplaced.toml --events cluster.jsonl
//! geoplaced check-config --config /etc/geoplace/geoplaced.toml
//! ```

mod config;
mod replay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use geoplace_geo::GeoReference;
use geoplace_inventory::NodeInventory;
use geoplace_placement::build_algorithm;
use geoplace_scheduler::Scheduler;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;
use crate::replay::{FeedStats, ReplayControlPlane};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(name = "geoplaced", about = "Geoplace placement daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler against a stream of cluster events.
    Run {
        /// Configuration file.
        #[arg(long)]
        config: PathBuf,

        /// JSON-lines event file; standard input when omitted.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Validate a configuration file and exit.
    CheckConfig {
        /// Configuration file.
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { config, events } => {
            let config = DaemonConfig::from_file(&config)?;
            init_tracing(&config)?;
            run(config, events.as_deref()).await
        }
        Command::CheckConfig { config: path } => {
            let config = DaemonConfig::from_file(&path)?;
            let gazetteer = config.gazetteer()?;
            println!("configuration OK: {}", path.display());
            println!("  algorithm:          {}", config.scheduler.algorithm);
            println!("  edge role label:    {}", config.labels.role);
            println!("  required location:  {}", config.workload_labels.required);
            println!("  preferred location: {}", config.workload_labels.preferred);
            println!("  subdivision keys:   {}", gazetteer.subdivision_keys());
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &DaemonConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log.filter)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run(config: DaemonConfig, events: Option<&Path>) -> anyhow::Result<()> {
    info!(algorithm = %config.scheduler.algorithm, "geoplace daemon starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Graceful shutdown on Ctrl-C.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Dropping the sender would stop every loop.
                warn!(error = %e, "failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
        }
    });

    let (stats, control_plane) = match events {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            info!(path = %path.display(), "replaying cluster events");
            serve(&config, BufReader::new(file), shutdown_rx).await?
        }
        None => {
            info!("reading cluster events from standard input");
            serve(&config, BufReader::new(tokio::io::stdin()), shutdown_rx).await?
        }
    };

    info!(
        node_events = stats.node_events,
        workloads = stats.workloads,
        skipped = stats.skipped,
        bound = control_plane.bound(),
        failed = control_plane.failed(),
        "geoplace daemon stopped"
    );
    Ok(())
}

/// Wire the subsystems together and replay `events` through them.
///
/// Returns once the event stream is exhausted and every in-flight decision
/// has finished, or once shutdown is signalled.
async fn serve<R>(
    config: &DaemonConfig,
    events: R,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<(FeedStats, Arc<ReplayControlPlane>)>
where
    R: AsyncBufRead + Unpin,
{
    let geo: Arc<dyn GeoReference> = Arc::new(config.gazetteer()?);
    let inventory = NodeInventory::new(geo.clone()).with_label_keys(config.labels.clone());
    info!(label = %config.labels.role, "node inventory initialized");

    let algorithm = build_algorithm(
        config.scheduler.algorithm,
        inventory.clone(),
        geo,
        config.workload_labels.clone(),
    );
    let control_plane = Arc::new(ReplayControlPlane::new());
    let scheduler = Scheduler::new(algorithm, inventory.clone(), control_plane.clone());

    let (node_tx, node_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (workload_tx, workload_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let applied = inventory.applied_events();
    let watcher_handle = tokio::spawn(inventory.run(node_rx, shutdown.clone()));
    let scheduler_handle = tokio::spawn(scheduler.run(workload_rx, shutdown.clone()));

    let mut feed_shutdown = shutdown;
    let stats = tokio::select! {
        result = replay::feed(events, node_tx, workload_tx, applied) => match result {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "event feed stopped early");
                FeedStats::default()
            }
        },
        _ = feed_shutdown.changed() => FeedStats::default(),
    };

    // The feed's senders are gone, so both loops drain and stop.
    join_background(vec![
        ("inventory watcher", watcher_handle),
        ("scheduler", scheduler_handle),
    ])
    .await?;

    Ok((stats, control_plane))
}

/// Waits for every background loop and fails if any of them panicked.
async fn join_background(tasks: Vec<(&'static str, JoinHandle<()>)>) -> anyhow::Result<()> {
    let mut failed = Vec::new();
    for (name, handle) in tasks {
        if let Err(e) = handle.await {
            error!(task = name, error = %e, "background task failed");
            failed.push(name);
        }
    }
    if !failed.is_empty() {
        anyhow::bail!("background tasks failed: {}", failed.join(", "));
    }
    Ok(())
}
