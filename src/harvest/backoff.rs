//! Pacing between fetches
//!
//! Exactly one pause is chosen per processed entry, in priority order:
//! 1. Cooldown, once the consecutive-failure streak reaches the threshold
//! 2. Rate-limit delay, when the fetch hit a throttle or challenge
//! 3. Normal jittered delay otherwise
//!
//! The cooldown always resets the streak, whatever kind of failure tripped it.

use crate::config::{DelayRange, SchedulerConfig};
use crate::state::BackoffState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

/// The pause to apply before the next entry is dequeued
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    Cooldown(Duration),
    RateLimit(Duration),
    Jitter(Duration),
}

impl Pacing {
    pub fn delay(&self) -> Duration {
        match self {
            Pacing::Cooldown(d) | Pacing::RateLimit(d) | Pacing::Jitter(d) => *d,
        }
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pacing::Cooldown(d) => write!(f, "cooldown {:.0}s", d.as_secs_f64()),
            Pacing::RateLimit(d) => write!(f, "rate-limit wait {:.0}s", d.as_secs_f64()),
            Pacing::Jitter(d) => write!(f, "delay {:.1}s", d.as_secs_f64()),
        }
    }
}

/// Tracks the failure streak and picks the pause after each fetch
pub struct BackoffController<R = StdRng> {
    cooldown_threshold: u32,
    cooldown: Duration,
    rate_limit_delay: DelayRange,
    normal_delay: DelayRange,
    state: BackoffState,
    rng: R,
}

impl BackoffController<StdRng> {
    /// Creates a controller seeded from OS entropy
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a controller with a fixed seed, for reproducible delays
    pub fn with_seed(config: &SchedulerConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BackoffController<R> {
    pub fn with_rng(config: &SchedulerConfig, rng: R) -> Self {
        Self {
            cooldown_threshold: config.cooldown_threshold,
            cooldown: config.cooldown(),
            rate_limit_delay: config.rate_limit_delay,
            normal_delay: config.normal_delay,
            state: BackoffState::new(),
            rng,
        }
    }

    /// Current failure streak
    pub fn state(&self) -> BackoffState {
        self.state
    }

    /// Records the result of one fetch and returns the pause to apply
    ///
    /// # Arguments
    ///
    /// * `succeeded` - Whether the fetch produced content
    /// * `rate_limited` - Whether the failure was a throttle or unresolved challenge
    pub fn pace(&mut self, succeeded: bool, rate_limited: bool) -> Pacing {
        if succeeded {
            self.state.record_success();
        } else {
            self.state.record_failure();
        }

        if self.state.reached(self.cooldown_threshold) {
            self.state.reset();
            return Pacing::Cooldown(self.cooldown);
        }

        if rate_limited {
            let delay = self.sample(self.rate_limit_delay);
            return Pacing::RateLimit(delay);
        }

        Pacing::Jitter(self.sample(self.normal_delay))
    }

    fn sample(&mut self, range: DelayRange) -> Duration {
        Duration::from_secs_f64(self.rng.gen_range(range.min..range.max))
    }
}
