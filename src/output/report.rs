//! End-of-run report
//!
//! Records how every item finished and writes the failure log.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Line appended to the failure log when the time budget stopped the run
pub const BUDGET_EXCEEDED_MARKER: &str = "BATCH STOPPED: Time Limit Exceeded";

/// Final state of one work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded,

    /// All attempts used up
    Failed { reason: String },

    /// Still queued when the time budget ran out
    Abandoned,
}

/// Append-only record of finalized items
///
/// A key is recorded at most once; later records for the same key are ignored.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    total_items: usize,
    outcomes: Vec<(String, ItemOutcome)>,
    finalized: HashSet<String>,
    budget_exceeded: bool,
}

impl RunReport {
    /// Creates an empty report for a run over `total_items` items
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, key: &str) {
        self.record(key, ItemOutcome::Succeeded);
    }

    pub fn record_failure(&mut self, key: &str, reason: impl Into<String>) {
        self.record(
            key,
            ItemOutcome::Failed {
                reason: reason.into(),
            },
        );
    }

    pub fn record_abandoned(&mut self, key: &str) {
        self.record(key, ItemOutcome::Abandoned);
    }

    /// Notes that the budget stopped the run; repeated calls have no effect
    pub fn mark_budget_exceeded(&mut self) {
        self.budget_exceeded = true;
    }

    fn record(&mut self, key: &str, outcome: ItemOutcome) {
        if !self.finalized.insert(key.to_string()) {
            tracing::warn!("Ignoring duplicate outcome for {}: {:?}", key, outcome);
            return;
        }
        self.outcomes.push((key.to_string(), outcome));
    }

    /// Number of items the run was started with
    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn budget_exceeded(&self) -> bool {
        self.budget_exceeded
    }

    /// The recorded outcome for `key`, if it was finalized
    pub fn outcome_of(&self, key: &str) -> Option<&ItemOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| outcome)
    }

    /// Keys that succeeded, in completion order
    pub fn succeeded(&self) -> Vec<&str> {
        self.keys_where(|o| matches!(o, ItemOutcome::Succeeded))
    }

    /// `(key, reason)` for every failed item, in completion order
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| match outcome {
                ItemOutcome::Failed { reason } => Some((key.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Keys never finished because the budget ran out
    pub fn abandoned(&self) -> Vec<&str> {
        self.keys_where(|o| matches!(o, ItemOutcome::Abandoned))
    }

    fn keys_where(&self, pred: impl Fn(&ItemOutcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| pred(outcome))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Lines of the failure log body: one per failed item, then the budget marker
    pub fn failure_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .failed()
            .into_iter()
            .map(|(key, reason)| format!("{}: {}", key, reason))
            .collect();

        if self.budget_exceeded {
            lines.push(BUDGET_EXCEEDED_MARKER.to_string());
        }

        lines
    }

    /// One-line human summary
    pub fn summary_line(&self) -> String {
        format!(
            "Scraping Summary: {} succeeded, {} failed, {} not reached.",
            self.succeeded().len(),
            self.failed().len(),
            self.abandoned().len()
        )
    }

    /// Writes the failure log if anything failed or the budget fired
    ///
    /// The file is UTF-8 with a byte-order mark, one entry per line, followed
    /// by a blank line and the total number of items attempted.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The log was written
    /// * `Ok(false)` - Nothing to report, no file created
    pub fn write_failure_log(&self, path: &Path) -> std::io::Result<bool> {
        let lines = self.failure_lines();
        if lines.is_empty() {
            return Ok(false);
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all("\u{feff}".as_bytes())?;
        for line in &lines {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total Funds Attempted: {}", self.total_items)?;
        writer.flush()?;

        Ok(true)
    }
}

/// Prints the run summary to stdout in a formatted manner
pub fn print_report(report: &RunReport) {
    println!("\n{}", report.summary_line());

    let failures = report.failure_lines();
    if !failures.is_empty() {
        println!("\nFailures:");
        for line in &failures {
            println!("  {}", line);
        }
    }

    let abandoned = report.abandoned();
    if !abandoned.is_empty() {
        println!("\nNot reached before the time budget ({}):", abandoned.len());
        for key in abandoned {
            println!("  - {}", key);
        }
    }
}
