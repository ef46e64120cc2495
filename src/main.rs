//! treefind - Parallel Filesystem Search
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use treefind::config::{CliArgs, SearchConfig};
use treefind::fs::LocalFs;
use treefind::progress::{print_header, print_result, print_summary, ProgressReporter};
use treefind::walker::matcher::validate_target;
use treefind::walker::{CancellationSignal, SearchCoordinator};

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
    let mut config = SearchConfig::from_args(args).context("Invalid configuration")?;

    if config.target.is_none() {
        let name = prompt_target().context("Failed to read target name")?;
        config = config.with_target(name);
    }

    let lister = LocalFs::new(config.follow_links);
    let coordinator = SearchCoordinator::new(config, lister);
    let config = coordinator.config();
    let target = config.target.as_deref().unwrap_or_default();

    if config.show_progress {
        print_header(&config.root.display().to_string(), target, config.threads);
    } else {
        println!("Looking for file with name: {}", target);
    }

    // Setup signal handler for graceful shutdown
    let signal = CancellationSignal::new();
    let interrupt = signal.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        interrupt.cancel();
    })
    .context("Failed to set signal handler")?;

    let show_progress = config.show_progress;
    let report = if show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Searching...");
        let updater = progress.clone();
        let report =
            coordinator.search_configured_with_progress(signal, move |p| updater.update(&p));
        progress.finish_and_clear();
        report
    } else {
        coordinator.search_configured(signal)
    }
    .context("Search failed")?;

    print_result(&report.result);

    if show_progress {
        print_summary(&report);
    }

    if !report.failures.is_empty() {
        info!(errors = report.failures.len(), "Some directories could not be read");
    }

    Ok(())
}

/// Ask for the target name on stdin
fn prompt_target() -> Result<String> {
    print!("Enter Filename: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let name = line.trim().to_string();

    validate_target(&name).context("Invalid target name")?;
    Ok(name)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("treefind=debug,warn")
    } else {
        EnvFilter::new("treefind=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
