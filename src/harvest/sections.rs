//! Daily snapshot of summary sections
//!
//! Each configured section is fetched once, without retries or pacing, and
//! its table is written to `<section>-<date>.csv`. A section that fails is
//! logged and skipped; the others still run.

use crate::config::SectionEntry;
use crate::harvest::classifier::failure_kind;
use crate::harvest::parser::extract_table_by_id;
use crate::harvest::{FetchOutcome, HttpFetcher};
use crate::output::CsvPersister;
use std::path::PathBuf;

/// How one section snapshot ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Table written to this file
    Saved(PathBuf),

    /// Table found but had no rows; nothing written
    Empty,

    /// Fetch, extraction or write failed
    Failed(String),
}

/// Fetches every section and writes its table next to the detail files
pub async fn snapshot_sections(
    fetcher: &HttpFetcher,
    persister: &CsvPersister,
    sections: &[SectionEntry],
) -> Vec<(String, SectionOutcome)> {
    let mut results = Vec::with_capacity(sections.len());

    for section in sections {
        tracing::info!("Scraping section {} from {}", section.name, section.url);
        let outcome = snapshot_one(fetcher, persister, section).await;

        match &outcome {
            SectionOutcome::Saved(path) => tracing::info!("Saved {}", path.display()),
            SectionOutcome::Empty => tracing::warn!("No rows found for {}", section.name),
            SectionOutcome::Failed(reason) => {
                tracing::error!("Error scraping {}: {}", section.name, reason)
            }
        }

        results.push((section.name.clone(), outcome));
    }

    results
}

async fn snapshot_one(
    fetcher: &HttpFetcher,
    persister: &CsvPersister,
    section: &SectionEntry,
) -> SectionOutcome {
    let outcome = fetcher.fetch_url(&section.url).await;
    let body = match outcome {
        FetchOutcome::Success(body) => body,
        other => {
            let reason = failure_kind(&other)
                .map(|kind| kind.to_string())
                .unwrap_or_default();
            return SectionOutcome::Failed(reason);
        }
    };

    let Some(table) = extract_table_by_id(&body, &section.table_id) else {
        return SectionOutcome::Failed(format!("table '{}' not found", section.table_id));
    };

    if table.is_empty() {
        return SectionOutcome::Empty;
    }

    let file_name = persister.section_file_name(&section.name);
    match persister.write_table(&file_name, &table) {
        Ok(path) => SectionOutcome::Saved(path),
        Err(e) => SectionOutcome::Failed(e.to_string()),
    }
}
