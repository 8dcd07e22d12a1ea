//! Harvest coordinator - the main fetch loop
//!
//! Pulls one entry at a time from the retry queue and, for each:
//! 1. Fetches the detail page
//! 2. Classifies the outcome into a retry decision
//! 3. Extracts and persists the table on success
//! 4. Re-enqueues or finalizes the entry
//! 5. Sleeps for the pause chosen by the backoff controller
//!
//! Nothing here runs concurrently: one fetch is in flight at most, and every
//! pause blocks the whole run.

use crate::config::{EmptyTablePolicy, SchedulerConfig};
use crate::harvest::backoff::{BackoffController, Pacing};
use crate::harvest::classifier::{failure_kind, FailureKind, RetryDecision, RetryPolicy};
use crate::harvest::parser::extract_first_table;
use crate::harvest::scheduler::{Next, RetryQueue};
use crate::harvest::{FetchOutcome, Fetcher};
use crate::output::{Persister, RunReport};
use crate::state::{BackoffState, QueueEntry, WorkItem};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;

/// Drives a list of work items through fetch, retry and pacing
pub struct Harvester<F, P, R = StdRng> {
    fetcher: F,
    persister: P,
    backoff: BackoffController<R>,
    policy: RetryPolicy,
    empty_table: EmptyTablePolicy,
    budget: Duration,
}

impl<F: Fetcher, P: Persister> Harvester<F, P, StdRng> {
    /// Creates a harvester with entropy-seeded jitter
    pub fn new(fetcher: F, persister: P, config: &SchedulerConfig) -> Self {
        Self::with_backoff(fetcher, persister, config, BackoffController::new(config))
    }
}

impl<F: Fetcher, P: Persister, R: Rng> Harvester<F, P, R> {
    /// Creates a harvester with a caller-supplied backoff controller
    pub fn with_backoff(
        fetcher: F,
        persister: P,
        config: &SchedulerConfig,
        backoff: BackoffController<R>,
    ) -> Self {
        Self {
            fetcher,
            persister,
            backoff,
            policy: RetryPolicy::new(config.max_attempts),
            empty_table: config.empty_table,
            budget: config.time_budget(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn persister(&self) -> &P {
        &self.persister
    }

    /// Current consecutive-failure streak
    pub fn backoff_state(&self) -> BackoffState {
        self.backoff.state()
    }

    /// Processes `items` until the queue drains or the time budget is spent
    ///
    /// Per-item failures never escape: they end up in the returned report.
    pub async fn run(&mut self, items: Vec<WorkItem>) -> RunReport {
        let total = items.len();
        let mut report = RunReport::new(total);
        let mut queue = RetryQueue::new(items, self.budget);
        let mut finished = 0usize;

        tracing::info!(
            "Starting harvest of {} items (budget {}s, max {} attempts, challenge wait: {})",
            total,
            self.budget.as_secs(),
            self.policy.max_attempts(),
            self.fetcher.can_wait_out_challenge()
        );

        loop {
            let entry = match queue.next_entry() {
                Next::Entry(entry) => entry,
                Next::Drained => {
                    tracing::info!("Queue is empty, harvest complete");
                    break;
                }
                Next::BudgetExceeded => {
                    tracing::warn!(
                        "Time budget of {}s reached after {:.0}s. Stopping with {} entries still queued.",
                        self.budget.as_secs(),
                        queue.elapsed().as_secs_f64(),
                        queue.len()
                    );
                    report.mark_budget_exceeded();
                    for item in queue.drain_remaining() {
                        report.record_abandoned(item.key());
                    }
                    break;
                }
            };

            tracing::info!(
                "[{}/{}] Processing {} (Attempt {})...",
                finished + 1,
                total,
                entry.key(),
                entry.attempt + 1
            );

            let (decision, rate_limited) = self.process_entry(&entry).await;
            let succeeded = decision == RetryDecision::Succeeded;

            match decision {
                RetryDecision::Succeeded => {
                    report.record_success(entry.key());
                    finished += 1;
                }
                RetryDecision::Retry => {
                    tracing::info!("  -> Re-queueing {} for retry later...", entry.key());
                    queue.requeue(entry);
                }
                RetryDecision::GiveUp(reason) => {
                    tracing::warn!("  -> Giving up on {}: {}", entry.key(), reason);
                    report.record_failure(entry.key(), reason);
                    finished += 1;
                }
            }

            let pacing = self.backoff.pace(succeeded, rate_limited);
            match pacing {
                Pacing::Cooldown(_) => {
                    tracing::warn!("[COOLDOWN] Consecutive failure limit hit. {}", pacing)
                }
                Pacing::RateLimit(_) => tracing::info!("  Throttled, {}", pacing),
                Pacing::Jitter(_) => tracing::debug!("  Next request after {}", pacing),
            }
            tokio::time::sleep(pacing.delay()).await;
        }

        tracing::info!("{}", report.summary_line());
        report
    }

    /// Fetches one entry and returns its decision plus the rate-limit pacing flag
    async fn process_entry(&mut self, entry: &QueueEntry) -> (RetryDecision, bool) {
        let outcome = self.fetcher.fetch(entry.key()).await;
        let mut decision = self.policy.classify(&outcome, entry.attempt);
        let mut rate_limited = false;

        match &outcome {
            FetchOutcome::Success(body) => {
                if let Some(kind) = self.handle_content(&entry.item, body) {
                    tracing::warn!("  Failed {}: {}", entry.key(), kind);
                    decision = self.policy.decide_failure(entry.attempt);
                }
            }
            other => {
                if let Some(kind) = failure_kind(other) {
                    tracing::warn!("  Failed {}: {}", entry.key(), kind);
                    rate_limited = kind.triggers_rate_limit_pacing();
                }
            }
        }

        (decision, rate_limited)
    }

    /// Extracts and persists the table from a fetched page
    ///
    /// Returns the failure kind when the page holds no usable table. A persist
    /// error is logged only: the fetch itself still counts as a success.
    fn handle_content(&self, item: &WorkItem, body: &str) -> Option<FailureKind> {
        let table = match extract_first_table(body) {
            Some(table) => table,
            None => return Some(FailureKind::MissingTable),
        };

        if table.is_empty() {
            return match self.empty_table {
                EmptyTablePolicy::Success => {
                    tracing::info!("  Table for {} has no rows, nothing to save", item.key());
                    None
                }
                EmptyTablePolicy::Failure => Some(FailureKind::MissingTable),
            };
        }

        match self.persister.persist(item, &table) {
            Ok(path) => tracing::info!("  Saved {} ({} rows)", path.display(), table.len()),
            Err(e) => tracing::error!("  Failed to save {}: {}", item.key(), e),
        }

        None
    }
}
