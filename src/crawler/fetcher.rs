//! HTTP fetcher implementation
//!
//! This module handles all network access for the crawler:
//! - Building the reqwest client with the configured user agent
//! - The [`Transport`] seam the fetcher talks through
//! - Retrying network-level failures with exponential backoff
//! - Feeding response times into the per-host slow tracker
//!
//! Any HTTP status counts as a successful fetch here. Only timeouts and
//! connection or transfer failures are retried.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::state::HostTracker;
use crate::url::extract_host;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use url::Url;

/// Maximum redirect hops followed for a single request
pub const MAX_REDIRECTS: usize = 10;

/// A network-level failure of a single attempt
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::Timeout => FailureCause::Timeout,
            Self::Connect(_) => FailureCause::Connect,
            Self::Network(_) => FailureCause::Network,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Category of a terminal fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    Timeout,
    Connect,
    Network,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Network => "network",
        };
        f.write_str(name)
    }
}

/// Error signal for a URL whose attempt budget was exhausted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlFailure {
    pub url: String,
    pub cause: FailureCause,
    pub message: String,
    pub attempts: u32,
}

/// What a transport hands back for one request
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL the response was served from, after redirects
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A single HTTP GET, with no retry or pacing of its own
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use ripple_crawler::config::UserAgentConfig;
/// use ripple_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            final_url,
            status,
            content_type,
            body,
        })
    }
}

/// Retry and pacing knobs for the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub slow_host_threshold: Duration,
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            timeout: config.timeout(),
            slow_host_threshold: config.slow_host_threshold(),
        }
    }
}

/// Delay before the retry that follows failed attempt `attempt` (0-indexed)
///
/// `base * 2^attempt` in whole milliseconds, saturating instead of
/// overflowing.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    /// Wall-clock time of the successful attempt
    pub response_time: Duration,
    /// Attempts made, including the successful one
    pub attempts: u32,
}

impl FetchedPage {
    /// Whether the response declares itself as hypertext
    pub fn is_hypertext(&self) -> bool {
        let mime = self
            .content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        mime == "text/html" || mime == "application/xhtml+xml"
    }
}

/// Fetches a URL, retrying network failures and honoring slow-host delays
pub struct RetryableFetcher {
    transport: Arc<dyn Transport>,
    hosts: Arc<HostTracker>,
    policy: RetryPolicy,
}

impl RetryableFetcher {
    pub fn new(transport: Arc<dyn Transport>, hosts: Arc<HostTracker>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            hosts,
            policy,
        }
    }

    pub fn hosts(&self) -> &HostTracker {
        &self.hosts
    }

    /// Performs one logical fetch of `url`
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Any HTTP response | Success, no retry |
    /// | Timeout / connect / transfer error | Sleep `retry_delay * 2^attempt`, retry |
    /// | `max_retries + 1` attempts failed | Return `CrawlFailure` |
    ///
    /// Before every attempt, a host marked slow is paused for its recorded
    /// delay. A successful response at or over `slow_host_threshold` marks
    /// the host slow.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, CrawlFailure> {
        let host = extract_host(url).unwrap_or_default();
        let budget = self.policy.max_retries.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            if let Some(delay) = self.hosts.delay_for(&host) {
                tracing::debug!("Host {} is slow, waiting {:?} before {}", host, delay, url);
                sleep(delay).await;
            }

            let started = Instant::now();
            let outcome = match timeout(self.policy.timeout, self.transport.get(url)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout),
            };
            let elapsed = started.elapsed();
            attempt += 1;

            let error = match outcome {
                Ok(response) => {
                    if self
                        .hosts
                        .record_response(&host, elapsed, self.policy.slow_host_threshold)
                    {
                        tracing::info!("Host {} responded in {:?}, marking slow", host, elapsed);
                    }

                    tracing::debug!(
                        "Fetched {} -> {} in {:?} (attempt {})",
                        url,
                        response.status,
                        elapsed,
                        attempt
                    );

                    return Ok(FetchedPage {
                        final_url: response.final_url,
                        status: response.status,
                        content_type: response.content_type.unwrap_or_default(),
                        body: response.body,
                        response_time: elapsed,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            if attempt >= budget {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
                return Err(CrawlFailure {
                    url: url.to_string(),
                    cause: error.cause(),
                    message: error.to_string(),
                    attempts: attempt,
                });
            }

            let backoff = backoff_delay(self.policy.retry_delay, attempt - 1);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                budget,
                url,
                error,
                backoff
            );
            sleep(backoff).await;
        }
    }
}
