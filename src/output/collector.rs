use crate::output::stats::CrawlMetrics;
use crate::url::extract_host;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

/// Outcome of one successfully fetched URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// URL as taken from the frontier
    pub url: String,
    /// URL the response was served from, after redirects
    pub final_url: String,
    pub depth: u32,
    pub title: Option<String>,
    pub status: u16,
    pub content_type: String,
    /// Links extracted from the page, before admission filtering
    pub links_found: usize,
    pub timestamp: DateTime<Utc>,
    pub response_time: Duration,
    pub attempts: u32,
}

impl CrawlResult {
    /// Case-insensitive substring match against the URL and title
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.url.to_lowercase().contains(&needle)
            || self
                .title
                .as_deref()
                .map_or(false, |t| t.to_lowercase().contains(&needle))
    }

    fn host(&self) -> Option<String> {
        Url::parse(&self.url).ok().as_ref().and_then(extract_host)
    }
}

/// Accumulates results in completion order for one crawl run
#[derive(Debug)]
pub struct ResultCollector {
    started_at: DateTime<Utc>,
    results: Mutex<Vec<CrawlResult>>,
}

impl ResultCollector {
    /// Creates an empty collector; the run's start time is taken now
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, result: CrawlResult) {
        self.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies out all results collected so far
    pub fn snapshot(&self) -> Vec<CrawlResult> {
        self.lock().clone()
    }

    /// Results whose URL or title contains `keyword`, ignoring case
    pub fn search(&self, keyword: &str) -> Vec<CrawlResult> {
        self.lock()
            .iter()
            .filter(|r| r.matches_keyword(keyword))
            .cloned()
            .collect()
    }

    /// Results per second since the run started
    pub fn throughput(&self) -> f64 {
        let elapsed = (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0;
        pages_per_second(self.len(), elapsed)
    }

    /// Derives the aggregate metrics, closing the run at `ended_at`
    pub fn metrics(&self, total_discovered: usize, ended_at: DateTime<Utc>) -> CrawlMetrics {
        let results = self.lock();
        let duration_seconds =
            ((ended_at - self.started_at).num_milliseconds().max(0)) as f64 / 1000.0;

        let distinct_hosts = results
            .iter()
            .filter_map(CrawlResult::host)
            .collect::<HashSet<_>>()
            .len();

        CrawlMetrics {
            start_time: self.started_at,
            end_time: ended_at,
            duration_seconds,
            total_crawled: results.len(),
            total_discovered,
            pages_per_second: pages_per_second(results.len(), duration_seconds),
            distinct_hosts_crawled: distinct_hosts,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CrawlResult>> {
        self.results.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn pages_per_second(count: usize, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        count as f64 / elapsed_seconds
    } else {
        0.0
    }
}
