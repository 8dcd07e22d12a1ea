use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Nav-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub listing: ListingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionEntry>,
}

/// HTTP client and target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Scheme and host of the target site
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Detail page path, `{key}` is replaced by the item key
    #[serde(rename = "detail-path")]
    pub detail_path: String,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long to keep polling a challenge page for real content (seconds, 0 disables)
    #[serde(rename = "challenge-wait-secs", default = "default_challenge_wait")]
    pub challenge_wait_secs: u64,

    /// Interval between polls while a challenge is pending (seconds)
    #[serde(rename = "challenge-poll-secs", default = "default_challenge_poll")]
    pub challenge_poll_secs: u64,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn challenge_wait(&self) -> Duration {
        Duration::from_secs(self.challenge_wait_secs)
    }

    pub fn challenge_poll(&self) -> Duration {
        Duration::from_secs(self.challenge_poll_secs)
    }
}

/// Retry, pacing and budget policy for the retry queue
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Total fetch attempts per item, first try included
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Consecutive failures that trigger a cooldown pause
    #[serde(rename = "cooldown-threshold")]
    pub cooldown_threshold: u32,

    #[serde(rename = "cooldown-secs")]
    pub cooldown_secs: u64,

    #[serde(rename = "rate-limit-delay-secs")]
    pub rate_limit_delay: DelayRange,

    #[serde(rename = "normal-delay-secs")]
    pub normal_delay: DelayRange,

    /// Wall-clock budget for a detailed run (seconds)
    #[serde(rename = "time-budget-secs")]
    pub time_budget_secs: u64,

    #[serde(rename = "empty-table")]
    pub empty_table: EmptyTablePolicy,
}

impl SchedulerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown_threshold: 3,
            cooldown_secs: 60,
            rate_limit_delay: DelayRange::new(20.0, 40.0),
            normal_delay: DelayRange::new(8.0, 15.0),
            time_budget_secs: 1500,
            empty_table: EmptyTablePolicy::Success,
        }
    }
}

/// Half-open range of seconds `[min, max)` a jittered delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, delay: Duration) -> bool {
        let secs = delay.as_secs_f64();
        secs >= self.min && secs < self.max
    }
}

impl From<(f64, f64)> for DelayRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// How a detail page whose table has no data rows is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTablePolicy {
    /// Logged, nothing persisted, counted as succeeded
    Success,
    /// Treated like a missing table: retried, then failed
    Failure,
}

/// Where the list of items comes from
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Listing page to fetch
    pub url: Option<String>,

    /// `id` attribute of the listing table on that page
    #[serde(rename = "table-id")]
    pub table_id: Option<String>,

    /// Previously saved listing CSV, used instead of `url`
    #[serde(rename = "csv-path")]
    pub csv_path: Option<String>,

    #[serde(rename = "key-column", default = "default_key_column")]
    pub key_column: String,

    #[serde(rename = "label-column", default = "default_label_column")]
    pub label_column: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives the CSV files
    pub directory: String,

    /// Path of the failure log written when any item failed
    #[serde(rename = "failure-log")]
    pub failure_log: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            failure_log: "scraping_errors.log".to_string(),
        }
    }
}

/// Summary section snapshotted by the daily task
#[derive(Debug, Clone, Deserialize)]
pub struct SectionEntry {
    /// Name used as the file prefix
    pub name: String,

    pub url: String,

    #[serde(rename = "table-id")]
    pub table_id: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_challenge_wait() -> u64 {
    15
}

fn default_challenge_poll() -> u64 {
    2
}

fn default_key_column() -> String {
    "Symbol".to_string()
}

fn default_label_column() -> String {
    "Name".to_string()
}
