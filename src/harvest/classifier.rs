//! Failure classification and retry decisions
//!
//! Every failure kind shares one retry budget: whether an item is retried
//! depends only on how many attempts it has used, never on why it failed.
//! The kind only decides whether the next pause uses the rate-limit range.

use crate::harvest::FetchOutcome;
use std::fmt;

/// Why a fetch did not produce usable content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Anti-bot interstitial did not clear within its wait window
    ChallengeUnresolved,

    /// Explicit throttle signal
    RateLimited,

    /// Connection or timeout failure
    Transport(String),

    /// Non-200 status other than the throttle codes
    UnexpectedStatus(u16),

    /// The page loaded but held no usable table
    MissingTable,
}

impl FailureKind {
    /// Whether the next pause should use the rate-limit delay range
    pub fn triggers_rate_limit_pacing(&self) -> bool {
        matches!(
            self,
            FailureKind::ChallengeUnresolved
                | FailureKind::RateLimited
                | FailureKind::UnexpectedStatus(403)
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ChallengeUnresolved => write!(f, "challenge page not cleared"),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::Transport(detail) => write!(f, "transport error: {}", detail),
            FailureKind::UnexpectedStatus(code) => write!(f, "HTTP {}", code),
            FailureKind::MissingTable => write!(f, "no table found"),
        }
    }
}

/// What the scheduler does with an entry after one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Content was fetched; the item is finished
    Succeeded,

    /// Re-enqueue at the back with the attempt count bumped
    Retry,

    /// Attempts exhausted; the reason goes into the failure log
    GiveUp(String),
}

/// Maps a fetch outcome to its failure kind, or `None` for success
pub fn failure_kind(outcome: &FetchOutcome) -> Option<FailureKind> {
    match outcome {
        FetchOutcome::Success(_) => None,
        FetchOutcome::ChallengePage => Some(FailureKind::ChallengeUnresolved),
        FetchOutcome::RateLimited => Some(FailureKind::RateLimited),
        FetchOutcome::TransportError(detail) => Some(FailureKind::Transport(detail.clone())),
        FetchOutcome::UnexpectedStatus(code) => Some(FailureKind::UnexpectedStatus(*code)),
    }
}

/// Attempt-bounded retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` fetches per item (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Classifies one fetch made with `attempt` prior attempts
    pub fn classify(&self, outcome: &FetchOutcome, attempt: u32) -> RetryDecision {
        match failure_kind(outcome) {
            None => RetryDecision::Succeeded,
            Some(_) => self.decide_failure(attempt),
        }
    }

    /// Retry while the attempt just made is not the last one allowed
    pub fn decide_failure(&self, attempt: u32) -> RetryDecision {
        let made = attempt + 1;
        if made < self.max_attempts {
            RetryDecision::Retry
        } else {
            RetryDecision::GiveUp(format!("Failed after {} attempts", made))
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
