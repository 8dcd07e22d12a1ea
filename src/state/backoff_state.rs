/// Count of consecutive failed fetches since the last success or cooldown
///
/// Owned by the pacing controller; there is exactly one per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackoffState {
    consecutive_failures: u32,
}

impl BackoffState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Records a failed fetch and returns the new count
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    /// A successful fetch breaks the failure streak
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Clears the counter after a cooldown pause
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Whether the streak has reached `threshold`
    pub fn reached(&self, threshold: u32) -> bool {
        self.consecutive_failures >= threshold
    }
}
