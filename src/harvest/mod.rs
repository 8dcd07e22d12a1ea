//! Harvest module for fetching fund holdings
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with challenge-page handling
//! - HTML table extraction
//! - Failure classification and retry decisions
//! - Cooldown and jittered pacing between requests
//! - The budgeted retry queue and the loop that drives it

mod backoff;
mod classifier;
mod coordinator;
mod fetcher;
mod listing;
mod parser;
mod scheduler;
mod sections;

pub use backoff::{BackoffController, Pacing};
pub use classifier::{failure_kind, FailureKind, RetryDecision, RetryPolicy};
pub use coordinator::Harvester;
pub use fetcher::{
    build_http_client, detail_url, is_challenge_page, FetchOutcome, Fetcher, HttpFetcher,
};
pub use listing::{items_from_table, listing_from_config, CsvListing, HtmlListing, ListingSource};
pub use parser::{extract_first_table, extract_table_by_id, Table};
pub use scheduler::{Next, RetryQueue};
pub use sections::{snapshot_sections, SectionOutcome};

use crate::config::Config;
use crate::output::{CsvPersister, RunReport};
use crate::HarvestResult;
use std::path::Path;

/// Runs a complete detailed harvest
///
/// This is the main entry point for fetching holdings. It will:
/// 1. Build the HTTP client
/// 2. Read the listing of funds
/// 3. Fetch every fund's detail page through the retry queue
/// 4. Write the failure log if anything failed
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished, possibly with per-item failures
/// * `Err(HarvestError)` - The run could not start (client or listing)
pub async fn run_harvest(config: &Config) -> HarvestResult<RunReport> {
    let fetcher = HttpFetcher::new(&config.client)?;
    let items = listing_from_config(config, &fetcher)?.list_items().await?;

    if items.is_empty() {
        tracing::warn!("Listing produced no items, nothing to fetch");
    }

    let persister = CsvPersister::new(&config.output.directory);
    let mut harvester = Harvester::new(fetcher, persister, &config.scheduler);
    let report = harvester.run(items).await;

    let log_path = Path::new(&config.output.failure_log);
    match report.write_failure_log(log_path) {
        Ok(true) => tracing::warn!("Check '{}' for the list of failures", log_path.display()),
        Ok(false) => tracing::info!("All items fetched successfully"),
        Err(e) => tracing::error!("Failed to write {}: {}", log_path.display(), e),
    }

    Ok(report)
}

/// Snapshots every configured summary section
pub async fn run_daily(config: &Config) -> HarvestResult<Vec<(String, SectionOutcome)>> {
    let fetcher = HttpFetcher::new(&config.client)?;
    let persister = CsvPersister::new(&config.output.directory);

    Ok(snapshot_sections(&fetcher, &persister, &config.sections).await)
}
