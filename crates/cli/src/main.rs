//! Testmend CLI - Main Entry Point
//!
//! Operator interface to the healing queue, the pattern cache and the
//! ad-hoc classifier.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use testmend_common::HealingConfig;

use testmend_cli::client::StoreClient;
use testmend_cli::commands::{analyze, pattern, queue};
use testmend_cli::output::{self, print_error};

/// Testmend CLI - self-healing triage for failed UI tests
#[derive(Parser)]
#[command(name = "testmend")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Store database path
    #[arg(long, env = "TESTMEND_DB", global = true)]
    db: Option<PathBuf>,

    /// Minimum confidence for adopting a healed selector
    #[arg(long, global = true)]
    confidence_floor: Option<f64>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Queue(queue::QueueCommands),

    #[command(flatten)]
    Analyze(analyze::AnalyzeCommands),

    /// Manage healing patterns
    #[command(subcommand)]
    Pattern(pattern::PatternCommands),

    /// Show version information
    Version,
}

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = HealingConfig::default();
    if let Some(floor) = cli.confidence_floor {
        config.confidence_floor = floor;
    }
    config.validate()?;

    let open_store = || {
        let path = cli.db.clone().unwrap_or_else(testmend_common::default_db_path);
        StoreClient::open(path, config.clone())
    };

    match cli.command {
        Commands::Queue(cmd) => queue::execute(cmd, &open_store()?, cli.format)?,
        Commands::Pattern(cmd) => pattern::execute(cmd, &open_store()?, cli.format)?,
        Commands::Analyze(cmd) => analyze::execute(cmd, &config, cli.format)?,
        Commands::Version => {
            println!("Testmend CLI v{}", testmend_common::VERSION);
            println!("Default store: {}", testmend_common::default_db_path().display());
        }
    }

    Ok(())
}
