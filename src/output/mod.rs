//! Output module for run results
//!
//! This module handles:
//! - Writing fetched tables to dated CSV files
//! - The end-of-run report and its failure log

mod persist;
mod report;

pub use persist::{sanitize_filename, CsvPersister, Persister};
pub use report::{print_report, ItemOutcome, RunReport, BUDGET_EXCEEDED_MARKER};
