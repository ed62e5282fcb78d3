//! random-walk - Bounded random walkers with a single aggregator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use random_walk::config::{CliArgs, RunConfig};
use random_walk::progress::{print_header, print_summary};
use random_walk::walker::{AsyncRunCoordinator, RunCoordinator, RunSummary};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = RunConfig::from_args(args).context("Invalid configuration")?;

    if config.show_summary {
        print_header(
            config.walker_count,
            config.domain_size,
            config.max_steps,
            if config.use_async { "async" } else { "threads" },
        );
    }

    let show_summary = config.show_summary;

    // Run in async or sync mode
    let summary = if config.use_async {
        run_async(config)?
    } else {
        run_sync(config)?
    };

    if show_summary {
        print_summary(&summary);
    }

    Ok(())
}

/// Run with one OS thread per walker
fn run_sync(config: RunConfig) -> Result<RunSummary> {
    RunCoordinator::new(config).run().context("Run failed")
}

/// Run the aggregator on the tokio runtime; walkers keep their own threads
fn run_async(config: RunConfig) -> Result<RunSummary> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(async {
        AsyncRunCoordinator::new(config)
            .run()
            .await
            .context("Async run failed")
    })
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("random_walk=debug,warn")
    } else {
        EnvFilter::new("random_walk=info,warn")
    };

    // Stdout is reserved for walker and controller lines
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
