//! Listing watcher CLI
//!
//! Local execution entry point: run the scheduler, a single cycle, or
//! inspect configuration and ledger state.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use watcher::{
    config,
    error::Result,
    pipeline::{PipelineRunner, Scheduler},
    storage::{FileLedger, Ledger},
};

/// watcher - new rental listing notifier
#[derive(Parser, Debug)]
#[command(
    name = "watcher",
    version,
    about = "Notifies once per new rental listing"
)]
struct Cli {
    /// Path to storage directory containing config.toml and the ledger
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run cycles on the configured interval until Ctrl-C
    Run,

    /// Run a single cycle and exit
    Once,

    /// Validate configuration
    Validate,

    /// Show configuration and ledger info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config(&cli.storage_dir)?;

    match cli.command {
        Command::Run => {
            config.validate_for_delivery()?;

            let runner = PipelineRunner::from_config(&config, &cli.storage_dir)?;
            let handle = Scheduler::new(runner, config.schedule.clone()).start();

            tokio::signal::ctrl_c().await?;
            log::info!("Ctrl-C received, stopping...");
            handle.stop().await;
        }

        Command::Once => {
            config.validate_for_delivery()?;

            let mut runner = PipelineRunner::from_config(&config, &cli.storage_dir)?;
            let report = runner.run_cycle().await?;
            log::info!(
                "{} new listings, {} notified",
                report.new_count,
                report.processing.notified
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            match config.validate_for_delivery() {
                Ok(()) => log::info!("✓ Notification credentials present"),
                Err(e) => log::warn!("{}", e),
            }
        }

        Command::Info => {
            let ledger_path = config.ledger.resolve_path(&cli.storage_dir);

            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Search URL: {}", config.query.to_url());
            log::info!(
                "Schedule: every {}s (initial delay {}s, run on start: {})",
                config.schedule.interval_secs,
                config.schedule.initial_delay_secs,
                config.schedule.run_on_start
            );

            let ledger = FileLedger::new(ledger_path);
            log::info!("Ledger: {}", ledger.path().display());
            let known = ledger.query_known(&config.ledger.partition).await?;
            log::info!(
                "Known listings in '{}': {}",
                config.ledger.partition,
                known.len()
            );
        }
    }

    Ok(())
}
