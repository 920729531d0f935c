//! Roster-Harvest main entry point
//!
//! Runs with no arguments using the built-in run parameters.

use anyhow::Context;
use clap::Parser;
use roster_harvest::config::{default_config, load_config_with_hash, Config};
use roster_harvest::harvester::harvest;
use roster_harvest::identifier::generate_identifiers;
use roster_harvest::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Roster-Harvest: a checkpointing student record harvester
///
/// Enumerates student identifiers, renders each record page, and writes the
/// extracted records batch by batch.
#[derive(Parser, Debug)]
#[command(name = "roster-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A checkpointing student record harvester", long_about = None)]
struct Cli {
    /// Optional TOML file overriding the built-in run parameters
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the identifier plan without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => default_config().context("built-in configuration is invalid")?,
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    tracing::info!(
        "Workers: {}, batch size: {}, output: {}",
        config.harvest.workers,
        config.harvest.batch_size,
        config.output.directory
    );

    match harvest(config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("roster_harvest=info,warn"),
            1 => EnvFilter::new("roster_harvest=debug,info"),
            2 => EnvFilter::new("roster_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: prints what would be harvested
fn handle_dry_run(config: &Config) {
    let identifiers = generate_identifiers(
        &config.harvest.years,
        config.harvest.max_sequence,
        &config.facilities,
    );

    println!("=== Roster-Harvest Dry Run ===\n");

    println!("Harvest:");
    println!("  Years: {}", config.harvest.years.join(", "));
    println!("  Max sequence: {}", config.harvest.max_sequence);
    println!("  Workers: {}", config.harvest.workers);
    println!("  Batch size: {}", config.harvest.batch_size);
    println!("  Marker timeout: {}ms", config.harvest.marker_timeout_ms);

    println!("\nTarget:");
    println!("  URL template: {}", config.target.url_template);
    println!("  Engine: {:?}", config.target.engine);

    println!("\nFacilities ({}):", config.facilities.len());
    for facility in &config.facilities {
        println!("  - {} {}", facility.code, facility.name);
        for department in &facility.departments {
            println!("    * {} {}", department.code, department.label);
        }
    }

    let batches = identifiers.len().div_ceil(config.harvest.batch_size.max(1));
    println!(
        "\n✓ Would harvest {} identifiers in {} batches",
        identifiers.len(),
        batches
    );
    if let (Some(first), Some(last)) = (identifiers.first(), identifiers.last()) {
        println!("  First: {}  Last: {}", first, last);
    }
}
