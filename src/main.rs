//! Nav-Harvest main entry point
//!
//! This is the command-line interface for the Nav-Harvest fund holdings fetcher.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use nav_harvest::config::{load_config_with_hash, Config};
use nav_harvest::harvest::{run_daily, run_harvest, SectionOutcome};
use nav_harvest::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Nav-Harvest: a patient fund holdings fetcher
///
/// Nav-Harvest reads a listing of funds and fetches each fund's holdings
/// table, one request at a time, backing off when the site throttles it and
/// stopping cleanly when the time budget runs out.
#[derive(Parser, Debug)]
#[command(name = "nav-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A patient fund holdings fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Which task to run
    #[arg(long, value_enum, default_value_t = Task::All)]
    task: Task,

    /// Override the scheduler time budget, in seconds
    #[arg(long, value_name = "SECS")]
    time_budget: Option<u64>,

    /// Validate config and show what would be fetched without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Task {
    /// Snapshot the summary sections
    Daily,
    /// Fetch every fund's holdings
    Detailed,
    /// Both, daily first
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(secs) = cli.time_budget {
        anyhow::ensure!(secs > 0, "--time-budget must be at least 1 second");
        tracing::info!("Time budget overridden to {}s", secs);
        config.scheduler.time_budget_secs = secs;
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.task);
        return Ok(());
    }

    if matches!(cli.task, Task::Daily | Task::All) {
        handle_daily(&config).await?;
    }

    if matches!(cli.task, Task::Detailed | Task::All) {
        handle_detailed(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("nav_harvest=info,warn"),
            1 => EnvFilter::new("nav_harvest=debug,info"),
            2 => EnvFilter::new("nav_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, task: Task) {
    println!("=== Nav-Harvest Dry Run ===\n");
    println!("Task: {:?}", task);

    println!("\nClient:");
    println!("  Base URL: {}", config.client.base_url);
    println!("  Detail path: {}", config.client.detail_path);
    println!("  Request timeout: {}s", config.client.request_timeout_secs);
    println!(
        "  Challenge wait: {}s (poll every {}s)",
        config.client.challenge_wait_secs, config.client.challenge_poll_secs
    );

    let scheduler = &config.scheduler;
    println!("\nScheduler:");
    println!("  Max attempts: {}", scheduler.max_attempts);
    println!(
        "  Cooldown: {}s after {} consecutive failures",
        scheduler.cooldown_secs, scheduler.cooldown_threshold
    );
    println!(
        "  Rate-limit delay: {}-{}s",
        scheduler.rate_limit_delay.min, scheduler.rate_limit_delay.max
    );
    println!(
        "  Normal delay: {}-{}s",
        scheduler.normal_delay.min, scheduler.normal_delay.max
    );
    println!("  Time budget: {}s", scheduler.time_budget_secs);
    println!("  Empty tables: {:?}", scheduler.empty_table);

    println!("\nListing:");
    match (&config.listing.csv_path, &config.listing.url) {
        (Some(path), _) => println!("  CSV file: {}", path),
        (None, Some(url)) => println!(
            "  Page: {} (table #{})",
            url,
            config.listing.table_id.as_deref().unwrap_or_default()
        ),
        (None, None) => println!("  (none)"),
    }
    println!(
        "  Columns: key '{}', label '{}'",
        config.listing.key_column, config.listing.label_column
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Failure log: {}", config.output.failure_log);

    println!("\nSections ({}):", config.sections.len());
    for section in &config.sections {
        println!("  - {} <- {} (table #{})", section.name, section.url, section.table_id);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the daily task: one snapshot per summary section
async fn handle_daily(config: &Config) -> anyhow::Result<()> {
    if config.sections.is_empty() {
        tracing::info!("No sections configured, skipping daily snapshot");
        return Ok(());
    }

    tracing::info!("--- Starting daily snapshot ---");
    let results = run_daily(config).await.context("daily snapshot failed")?;

    let saved = results
        .iter()
        .filter(|(_, outcome)| matches!(outcome, SectionOutcome::Saved(_)))
        .count();
    tracing::info!("Daily snapshot finished: {}/{} sections saved", saved, results.len());

    Ok(())
}

/// Handles the detailed task: the budgeted holdings harvest
async fn handle_detailed(config: &Config) -> anyhow::Result<()> {
    tracing::info!("--- Starting detailed harvest ---");

    let report = match run_harvest(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);
    Ok(())
}
