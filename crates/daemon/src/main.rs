//! Testmend Daemon
//!
//! Drains the healing queue in the background and sweeps old records.

use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod state;
mod worker;

use config::DaemonConfig;

#[derive(Parser)]
#[command(name = "testmendd")]
#[command(about = "Testmend daemon - classifies failed UI tests and heals broken selectors")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TESTMEND_CONFIG")]
    config: Option<PathBuf>,

    /// Store directory
    #[arg(short, long, env = "TESTMEND_STORE")]
    store: Option<PathBuf>,

    /// Number of analysis workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Disable the retention sweeper
    #[arg(long)]
    no_retention: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Testmend daemon v{}", testmend_common::VERSION);

    // Load configuration; flags override the file
    let config_path = cli
        .config
        .unwrap_or_else(|| testmend_common::default_store_path().join("config.toml"));
    let mut config = DaemonConfig::load(&config_path)?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(workers) = cli.workers {
        config.workers.count = workers;
    }
    if cli.no_retention {
        config.retention.enabled = false;
    }
    config.validate()?;

    // Ensure store directory exists
    tokio::fs::create_dir_all(&config.store_path).await?;

    let state = state::StateManager::new(&config)?;
    if !state.queue().health() {
        anyhow::bail!("store at {} is not readable", config.db_path().display());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = worker::WorkerPool::new(state.clone(), shutdown_rx).spawn();

    info!("Daemon started with store {}", config.store_path.display());

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    shutdown_tx.send(true)?;
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Worker task error: {}", e);
        }
    }

    state.cache().flush();
    info!("Daemon shutdown complete");
    Ok(())
}
