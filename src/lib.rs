//! Nav-Harvest: a patient fund-holdings fetcher
//!
//! This crate fetches per-fund holdings tables from a rate-limited,
//! challenge-guarded website. Items are processed one at a time through a
//! retrying FIFO queue with cooldowns, jittered pacing and a wall-clock budget.

pub mod config;
pub mod harvest;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Nav-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Listing extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while building the list of items to fetch
///
/// Any of these is fatal for a detailed run: there is nothing to schedule.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to fetch listing {url}: {detail}")]
    Fetch { url: String, detail: String },

    #[error("Listing {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Table '{table_id}' not found in listing")]
    TableMissing { table_id: String },

    #[error("Listing has no '{0}' column")]
    ColumnMissing(String),

    #[error("Failed to read listing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from writing a fetched table to durable storage
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for Nav-Harvest operations
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{FetchOutcome, Fetcher, Harvester, RetryDecision};
pub use output::RunReport;
pub use state::{BackoffState, QueueEntry, WorkItem};
