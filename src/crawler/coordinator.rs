//! Crawler coordinator - worker pool and run lifecycle
//!
//! [`Crawler`] holds only immutable configuration and shared collaborators
//! (transport, link extractor, failure channel). Every call to
//! [`Crawler::run`] builds a fresh [`Session`] that owns the frontier, the
//! host tracker, and the result collector for that run alone, so one
//! `Crawler` can serve concurrent runs without them seeing each other.

use crate::config::{validate, validate_crawler_config, Config, CrawlerConfig};
use crate::crawler::fetcher::{
    CrawlFailure, FetchedPage, ReqwestTransport, RetryPolicy, RetryableFetcher, Transport,
};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor, ParsedPage};
use crate::output::{CrawlMetrics, CrawlResult, ResultCollector};
use crate::state::HostTracker;
use crate::CrawlError;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Successful fetches, in completion order
    pub results: Vec<CrawlResult>,
    /// URLs that exhausted their retries
    pub failures: Vec<CrawlFailure>,
    pub metrics: CrawlMetrics,
    /// Every URL claimed by a worker, sorted
    pub visited: Vec<String>,
    /// Hosts marked slow during the run, sorted
    pub slow_hosts: Vec<String>,
}

impl CrawlReport {
    /// Results whose URL or title contains `keyword`, ignoring case
    pub fn search(&self, keyword: &str) -> Vec<&CrawlResult> {
        self.results
            .iter()
            .filter(|r| r.matches_keyword(keyword))
            .collect()
    }

    pub fn total_crawled(&self) -> usize {
        self.results.len()
    }

    pub fn discovered_count(&self) -> usize {
        self.metrics.total_discovered
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pages_per_second(&self) -> f64 {
        self.metrics.pages_per_second
    }
}

/// Configured crawler; call [`Crawler::run`] once per seed
pub struct Crawler {
    config: CrawlerConfig,
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn LinkExtractor>,
    failure_tx: Option<UnboundedSender<CrawlFailure>>,
}

impl Crawler {
    /// Creates a crawler that talks HTTP through reqwest
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        validate(&config)?;
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Self::with_transport(config.crawler, Arc::new(transport))
    }

    /// Creates a crawler over a custom transport
    pub fn with_transport(
        config: CrawlerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, CrawlError> {
        validate_crawler_config(&config)?;
        Ok(Self {
            config,
            transport,
            extractor: Arc::new(HtmlLinkExtractor),
            failure_tx: None,
        })
    }

    /// Replaces the default HTML link extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Streams every terminal fetch failure to `tx` as it happens
    ///
    /// Failures are also returned in [`CrawlReport::failures`].
    pub fn report_failures_to(mut self, tx: UnboundedSender<CrawlFailure>) -> Self {
        self.failure_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawls from `seed` until the frontier drains
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run completed; individual URLs may still have failed
    /// * `Err(CrawlError::InvalidSeedUrl)` - `seed` is not an absolute HTTP(S) URL
    pub async fn run(&self, seed: &str) -> Result<CrawlReport, CrawlError> {
        let session = Arc::new(Session::new(self));
        let seed = session.frontier.seed(seed)?;

        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            seed,
            self.config.max_depth,
            self.config.max_concurrency
        );

        let report = session.drain().await;

        tracing::info!(
            "Crawl completed: {} pages crawled, {} failed, {} discovered in {:.2}s",
            report.results.len(),
            report.failures.len(),
            report.metrics.total_discovered,
            report.metrics.duration_seconds
        );

        Ok(report)
    }
}

/// Crawls `seed_url` with `config`
///
/// Convenience entry point equivalent to `Crawler::new(config)?.run(seed_url)`.
pub async fn crawl(seed_url: &str, config: Config) -> Result<CrawlReport, CrawlError> {
    Crawler::new(config)?.run(seed_url).await
}

/// State owned by a single crawl run
struct Session {
    config: CrawlerConfig,
    frontier: Frontier,
    fetcher: RetryableFetcher,
    hosts: Arc<HostTracker>,
    extractor: Arc<dyn LinkExtractor>,
    collector: ResultCollector,
    failures: Mutex<Vec<CrawlFailure>>,
    failure_tx: Option<UnboundedSender<CrawlFailure>>,
}

impl Session {
    fn new(crawler: &Crawler) -> Self {
        let hosts = Arc::new(HostTracker::new());
        let fetcher = RetryableFetcher::new(
            crawler.transport.clone(),
            hosts.clone(),
            RetryPolicy::from(&crawler.config),
        );

        Self {
            config: crawler.config.clone(),
            frontier: Frontier::new(crawler.config.max_depth),
            fetcher,
            hosts,
            extractor: crawler.extractor.clone(),
            collector: ResultCollector::new(),
            failures: Mutex::new(Vec::new()),
            failure_tx: crawler.failure_tx.clone(),
        }
    }

    /// Runs the worker pool to completion and assembles the report
    async fn drain(self: Arc<Self>) -> CrawlReport {
        let mut workers = JoinSet::new();
        for id in 0..self.config.max_concurrency {
            let session = self.clone();
            workers.spawn(async move { session.work(id).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        self.report()
    }

    /// One worker: take, claim, fetch, pause, repeat
    async fn work(&self, id: u32) {
        let politeness = self.config.delay_between_requests();

        while let Some(lease) = self.frontier.take().await {
            let entry = lease.entry().clone();

            if !self.frontier.claim(&entry.url) {
                tracing::debug!("Worker {} skipping already visited {}", id, entry.url);
                continue;
            }

            tracing::debug!("Worker {} visiting {} (depth {})", id, entry.url, entry.depth);
            self.visit(&entry).await;
            drop(lease);

            if !politeness.is_zero() {
                tokio::time::sleep(politeness).await;
            }
        }

        tracing::debug!("Worker {} exiting, frontier drained", id);
    }

    async fn visit(&self, entry: &FrontierEntry) {
        match self.fetcher.fetch(&entry.url).await {
            Ok(page) => {
                let parsed = if page.is_hypertext() {
                    self.extractor.extract(&page.body, &page.final_url)
                } else {
                    ParsedPage::default()
                };

                self.admit_links(entry, &page, &parsed);
                self.collector.push(build_result(entry, page, parsed));
            }
            Err(failure) => self.record_failure(failure),
        }
    }

    /// Offers every extracted link at depth + 1, bounded to the page's own origin
    fn admit_links(&self, entry: &FrontierEntry, page: &FetchedPage, parsed: &ParsedPage) {
        let origin = page.final_url.origin();
        let next_depth = entry.depth.saturating_add(1);

        let admitted = parsed
            .links
            .iter()
            .filter(|link| {
                self.frontier
                    .admit((*link).clone(), next_depth, &origin)
                    .is_admitted()
            })
            .count();

        tracing::debug!(
            "{}: {} links found, {} admitted",
            entry.url,
            parsed.links.len(),
            admitted
        );
    }

    fn record_failure(&self, failure: CrawlFailure) {
        tracing::warn!(
            "Failed to fetch {} ({}): {}",
            failure.url,
            failure.cause,
            failure.message
        );

        if let Some(tx) = &self.failure_tx {
            // A dropped receiver just means nobody is listening live.
            let _ = tx.send(failure.clone());
        }

        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(failure);
    }

    fn report(&self) -> CrawlReport {
        let metrics = self
            .collector
            .metrics(self.frontier.discovered_count(), Utc::now());

        CrawlReport {
            results: self.collector.snapshot(),
            failures: self
                .failures
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            metrics,
            visited: self.frontier.visited_urls(),
            slow_hosts: self.hosts.slow_hosts(),
        }
    }
}

fn build_result(entry: &FrontierEntry, page: FetchedPage, parsed: ParsedPage) -> CrawlResult {
    CrawlResult {
        url: entry.url.to_string(),
        final_url: page.final_url.to_string(),
        depth: entry.depth,
        title: parsed.title,
        status: page.status,
        content_type: page.content_type,
        links_found: parsed.links.len(),
        timestamp: Utc::now(),
        response_time: page.response_time,
        attempts: page.attempts,
    }
}
