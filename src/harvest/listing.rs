//! Work item discovery
//!
//! The list of funds comes either from a table on a listing page or from a
//! previously saved listing CSV. Rows with a blank key or label are skipped,
//! and repeated keys keep their first occurrence.

use crate::config::{Config, ListingConfig};
use crate::harvest::parser::{extract_table_by_id, Table};
use crate::harvest::{FetchOutcome, HttpFetcher};
use crate::state::WorkItem;
use crate::{ConfigError, ConfigResult, ExtractionError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;

/// Produces the ordered list of items for a detailed run
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn list_items(&self) -> Result<Vec<WorkItem>, ExtractionError>;
}

/// Listing read from a table on a web page
pub struct HtmlListing {
    fetcher: HttpFetcher,
    url: String,
    table_id: String,
    key_column: String,
    label_column: String,
}

impl HtmlListing {
    pub fn new(fetcher: HttpFetcher, url: &str, table_id: &str, config: &ListingConfig) -> Self {
        Self {
            fetcher,
            url: url.to_string(),
            table_id: table_id.to_string(),
            key_column: config.key_column.clone(),
            label_column: config.label_column.clone(),
        }
    }
}

#[async_trait]
impl ListingSource for HtmlListing {
    async fn list_items(&self) -> Result<Vec<WorkItem>, ExtractionError> {
        tracing::info!("Fetching listing from {}", self.url);

        let body = match self.fetcher.fetch_url(&self.url).await {
            FetchOutcome::Success(body) => body,
            FetchOutcome::ChallengePage => {
                return Err(ExtractionError::Fetch {
                    url: self.url.clone(),
                    detail: "challenge page not cleared".to_string(),
                })
            }
            FetchOutcome::RateLimited => {
                return Err(ExtractionError::Fetch {
                    url: self.url.clone(),
                    detail: "rate limited".to_string(),
                })
            }
            FetchOutcome::TransportError(detail) => {
                return Err(ExtractionError::Fetch {
                    url: self.url.clone(),
                    detail,
                })
            }
            FetchOutcome::UnexpectedStatus(status) => {
                return Err(ExtractionError::Status {
                    url: self.url.clone(),
                    status,
                })
            }
        };

        let table = extract_table_by_id(&body, &self.table_id).ok_or_else(|| {
            ExtractionError::TableMissing {
                table_id: self.table_id.clone(),
            }
        })?;

        items_from_table(&table, &self.key_column, &self.label_column)
    }
}

/// Listing read from a CSV file saved by an earlier run
pub struct CsvListing {
    path: PathBuf,
    key_column: String,
    label_column: String,
}

impl CsvListing {
    pub fn new(path: impl Into<PathBuf>, config: &ListingConfig) -> Self {
        Self {
            path: path.into(),
            key_column: config.key_column.clone(),
            label_column: config.label_column.clone(),
        }
    }

    fn read_table(&self) -> Result<Table, ExtractionError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Table { headers, rows })
    }
}

#[async_trait]
impl ListingSource for CsvListing {
    async fn list_items(&self) -> Result<Vec<WorkItem>, ExtractionError> {
        tracing::info!("Reading listing from {}", self.path.display());
        let table = self.read_table()?;
        items_from_table(&table, &self.key_column, &self.label_column)
    }
}

/// Picks the listing source named by the configuration
pub fn listing_from_config(
    config: &Config,
    fetcher: &HttpFetcher,
) -> ConfigResult<Box<dyn ListingSource>> {
    let listing = &config.listing;
    match (&listing.csv_path, &listing.url, &listing.table_id) {
        (Some(path), None, _) => Ok(Box::new(CsvListing::new(path, listing))),
        (None, Some(url), Some(table_id)) => Ok(Box::new(HtmlListing::new(
            fetcher.clone(),
            url,
            table_id,
            listing,
        ))),
        _ => Err(ConfigError::Validation(
            "listing needs either csv-path, or url with table-id".to_string(),
        )),
    }
}

/// Builds work items from the key and label columns of a listing table
pub fn items_from_table(
    table: &Table,
    key_column: &str,
    label_column: &str,
) -> Result<Vec<WorkItem>, ExtractionError> {
    let key_idx = table
        .column_index(key_column)
        .ok_or_else(|| ExtractionError::ColumnMissing(key_column.to_string()))?;
    let label_idx = table
        .column_index(label_column)
        .ok_or_else(|| ExtractionError::ColumnMissing(label_column.to_string()))?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(table.len());

    for (row_no, row) in table.rows.iter().enumerate() {
        let key = row.get(key_idx).map(String::as_str).unwrap_or_default();
        let label = row.get(label_idx).map(String::as_str).unwrap_or_default();

        let Some(item) = WorkItem::new(key, label) else {
            tracing::warn!("Skipping listing row {} with blank key or label", row_no + 1);
            continue;
        };

        if !seen.insert(item.key().to_string()) {
            tracing::warn!("Skipping duplicate listing key {}", item.key());
            continue;
        }

        items.push(item);
    }

    tracing::info!("Found {} items in listing", items.len());
    Ok(items)
}
