//! Grid router binary.
//!
//! Starts one router node against a simulated config server and runs the
//! maintenance loop until interrupted.
//!
//! ```bash
//! grid-server --node-id 1 --shard 1:db1.example.net:27018 --shard 2:db2.example.net:27018
//! ```
//!
//! Pass `--migrate-to-consensus` to exercise the one-way migration from the
//! legacy mirrored config servers to a consensus replica set after startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use grid_catalog::{ConfigServerMode, ShardType, SimulatedCatalogManager};
use grid_core::{Limits, ShardId};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use grid_server::{maintenance_task, MaintenanceConfig, Router};

/// Config server protocol to start with.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Mode {
    /// Legacy mirrored config servers.
    #[default]
    Legacy,
    /// Consensus replica set.
    Consensus,
}

impl From<Mode> for ConfigServerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Legacy => Self::Legacy,
            Mode::Consensus => Self::Consensus,
        }
    }
}

/// Grid query router.
#[derive(Parser, Debug)]
#[command(name = "grid-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Node ID for this router.
    #[arg(long, default_value = "1")]
    node_id: u64,

    /// Config server protocol at startup.
    #[arg(long, value_enum, default_value = "legacy")]
    config_mode: Mode,

    /// Migrate the catalog manager to the consensus protocol after startup.
    #[arg(long)]
    migrate_to_consensus: bool,

    /// Allow shards on local host addresses.
    #[arg(long)]
    allow_local_host: bool,

    /// Shard in format `shard_id:host:port`. Can be specified multiple times.
    #[arg(long = "shard", value_parser = parse_shard)]
    shards: Vec<ShardType>,

    /// Seed for the simulated config server.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Interval between balancer probes (ms).
    #[arg(long, default_value = "10000")]
    balancer_interval_ms: u64,

    /// Interval between idle cursor sweeps (ms).
    #[arg(long, default_value = "60000")]
    cursor_reap_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: Level,
}

/// Parses a shard specification in format `shard_id:host:port`.
fn parse_shard(s: &str) -> Result<ShardType, String> {
    let (id, host) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid shard format '{s}', expected 'shard_id:host:port'"))?;

    let id: u64 = id
        .parse()
        .map_err(|_| format!("invalid shard_id '{id}' in shard '{s}'"))?;

    if host.is_empty() || !host.contains(':') {
        return Err(format!("invalid host '{host}' in shard '{s}', expected 'host:port'"));
    }

    Ok(ShardType::new(ShardId::new(id), host))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mode = ConfigServerMode::from(args.config_mode);
    info!(
        node_id = args.node_id,
        mode = %mode,
        shard_count = args.shards.len(),
        "Starting grid router"
    );

    let catalog = SimulatedCatalogManager::new(args.seed, mode);
    let router = Arc::new(Router::start(
        args.node_id,
        &Limits::default(),
        args.allow_local_host,
        Box::new(catalog.clone()),
    )?);

    for shard in args.shards {
        router.register_shard(shard.clone()).await?;
        catalog.add_shard(shard);
    }

    if args.migrate_to_consensus {
        let replacement = catalog.with_mode(ConfigServerMode::Consensus);
        match router.migrate_catalog(Box::new(replacement)).await {
            Ok(outcome) => info!(outcome = ?outcome, "Config server migration complete"),
            Err(e) => warn!(error = %e, "Config server migration refused"),
        }
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let maintenance = MaintenanceConfig {
        balancer_interval_ms: args.balancer_interval_ms,
        cursor_reap_interval_ms: args.cursor_reap_interval_ms,
    };
    let handle = tokio::spawn(maintenance_task(Arc::clone(&router), maintenance, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown_tx.send(()).await?;
    handle.await?;

    Ok(())
}
