use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_MAX_CONCURRENCY: u32 = 5;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_DELAY_BETWEEN_REQUESTS_MS: u64 = 100;
pub const DEFAULT_SLOW_HOST_THRESHOLD_MS: u64 = 15_000;

/// Main configuration structure
///
/// Every table and every key is optional; a missing key takes the default
/// documented on the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawl engine configuration, immutable for the duration of a run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of link hops from the seed (default 3)
    pub max_depth: u32,

    /// Number of concurrent workers (default 5)
    pub max_concurrency: u32,

    /// Per-request timeout in milliseconds (default 30000)
    pub timeout: u64,

    /// Retries after the first failed attempt (default 3)
    pub max_retries: u32,

    /// Backoff base in milliseconds (default 1000)
    pub retry_delay: u64,

    /// Politeness pause after each fetch, in milliseconds (default 100)
    pub delay_between_requests: u64,

    /// Response time in milliseconds at which a host is marked slow (default 15000)
    pub slow_host_threshold: u64,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests)
    }

    pub fn slow_host_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_host_threshold)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY_MS,
            delay_between_requests: DEFAULT_DELAY_BETWEEN_REQUESTS_MS,
            slow_host_threshold: DEFAULT_SLOW_HOST_THRESHOLD_MS,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RippleCrawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}
