//! HTTP fetcher implementation
//!
//! This module performs every request the harvester makes:
//! - Building the HTTP client with a browser user agent and bounded timeouts
//! - Fetching a fund's detail page and classifying the raw result
//! - Detecting anti-bot interstitials and, when allowed, waiting them out

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::Instant;

/// Text fragments that only appear on the anti-bot interstitial
const CHALLENGE_MARKERS: [&str; 2] = ["Just a moment", "Checking your browser"];

/// Result of a single fetch, consumed immediately by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with real content
    Success(String),

    /// An interstitial challenge that did not clear in time
    ChallengePage,

    /// Explicit throttling (HTTP 403 or 429)
    RateLimited,

    /// Connection, timeout or body read failure
    TransportError(String),

    /// Any other non-200 status
    UnexpectedStatus(u16),
}

/// A strategy for fetching one item's detail page
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the detail page for `key` and classifies the result
    async fn fetch(&self, key: &str) -> FetchOutcome;

    /// Whether this strategy can wait for a challenge page to resolve itself
    fn can_wait_out_challenge(&self) -> bool;
}

/// Builds an HTTP client with proper configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true when the body is an anti-bot interstitial rather than content
pub fn is_challenge_page(body: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Builds the detail page URL for an item key
///
/// # Example
///
/// ```
/// use nav_harvest::harvest::detail_url;
///
/// let url = detail_url("https://funds.example.com/", "/mutual-fund-navs/{key}?fsk=fs", "NBF2");
/// assert_eq!(url, "https://funds.example.com/mutual-fund-navs/NBF2?fsk=fs");
/// ```
pub fn detail_url(base_url: &str, detail_path: &str, key: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
    format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        detail_path.replace("{key}", &encoded)
    )
}

/// reqwest-backed fetcher
///
/// With a non-zero challenge window it re-polls a challenge page until real
/// content appears or the window closes. With a zero window a challenge page
/// is reported as-is.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    detail_path: String,
    challenge_wait: Duration,
    challenge_poll: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the client configuration
    ///
    /// This is the one setup step that can abort a run before any item is fetched.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.clone(),
            detail_path: config.detail_path.clone(),
            challenge_wait: config.challenge_wait(),
            challenge_poll: config.challenge_poll(),
        })
    }

    /// Fetches an arbitrary URL, handling challenge pages
    pub async fn fetch_url(&self, url: &str) -> FetchOutcome {
        let outcome = self.get_once(url).await;

        match outcome {
            FetchOutcome::ChallengePage if self.can_wait_out_challenge() => {
                tracing::info!("  Challenge detected for {}. Waiting for it to clear...", url);
                self.wait_out_challenge(url).await
            }
            FetchOutcome::ChallengePage => {
                tracing::info!("  Challenge detected for {}", url);
                FetchOutcome::ChallengePage
            }
            other => other,
        }
    }

    /// Re-polls `url` until a non-challenge page comes back or the window closes
    async fn wait_out_challenge(&self, url: &str) -> FetchOutcome {
        let deadline = Instant::now() + self.challenge_wait;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("  Challenge NOT cleared for {}", url);
                return FetchOutcome::ChallengePage;
            }

            tokio::time::sleep(self.challenge_poll.min(remaining)).await;

            // A slow re-poll must not stretch the window past its deadline
            let poll = match tokio::time::timeout_at(deadline, self.get_once(url)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!("  Challenge NOT cleared for {} (re-poll timed out)", url);
                    return FetchOutcome::ChallengePage;
                }
            };

            match poll {
                FetchOutcome::ChallengePage => continue,
                FetchOutcome::Success(body) => {
                    tracing::info!("  Challenge cleared for {}", url);
                    return FetchOutcome::Success(body);
                }
                other => return other,
            }
        }
    }

    /// One GET, classified by status and body
    async fn get_once(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return transport_error(e),
        };

        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::RateLimited;
        }

        if status != StatusCode::OK {
            return FetchOutcome::UnexpectedStatus(status.as_u16());
        }

        match response.text().await {
            Ok(body) if is_challenge_page(&body) => FetchOutcome::ChallengePage,
            Ok(body) => FetchOutcome::Success(body),
            Err(e) => transport_error(e),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> FetchOutcome {
        let url = detail_url(&self.base_url, &self.detail_path, key);
        self.fetch_url(&url).await
    }

    fn can_wait_out_challenge(&self) -> bool {
        !self.challenge_wait.is_zero()
    }
}

fn transport_error(e: reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::TransportError("Request timeout".to_string())
    } else if e.is_connect() {
        FetchOutcome::TransportError("Connection refused".to_string())
    } else {
        FetchOutcome::TransportError(e.to_string())
    }
}
