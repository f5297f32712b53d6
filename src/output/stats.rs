//! Aggregate crawl statistics
//!
//! [`CrawlMetrics`] is the summary an export or reporting collaborator
//! consumes once a run has finished.

use crate::crawler::CrawlReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Aggregate metrics for a finished crawl run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlMetrics {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    /// Number of successfully fetched URLs
    pub total_crawled: usize,
    /// Number of URLs ever admitted to the frontier
    pub total_discovered: usize,
    pub pages_per_second: f64,
    pub distinct_hosts_crawled: usize,
}

/// Prints a crawl report to stdout in a formatted manner
pub fn print_statistics(report: &CrawlReport) {
    let metrics = &report.metrics;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", metrics.start_time.to_rfc3339());
    println!("  Finished: {}", metrics.end_time.to_rfc3339());
    println!("  Duration: {:.2}s", metrics.duration_seconds);
    println!("  Pages crawled: {}", metrics.total_crawled);
    println!("  URLs discovered: {}", metrics.total_discovered);
    println!("  URLs visited: {}", report.visited.len());
    println!("  Distinct hosts: {}", metrics.distinct_hosts_crawled);
    println!("  Throughput: {:.2} pages/sec", metrics.pages_per_second);
    println!();

    let status_counts = count_by_status(report);
    if !status_counts.is_empty() {
        println!("Responses by Status:");
        let mut counts: Vec<_> = status_counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (status, count) in counts {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    if !report.slow_hosts.is_empty() {
        println!("Slow Hosts ({}):", report.slow_hosts.len());
        for host in &report.slow_hosts {
            println!("  - {}", host);
        }
        println!();
    }

    if !report.failures.is_empty() {
        println!("Failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!(
                "  - {} [{}] after {} attempts: {}",
                failure.url, failure.cause, failure.attempts, failure.message
            );
        }
        println!();
    }

    let attempted = metrics.total_crawled + report.failures.len();
    let success_rate = if attempted > 0 {
        (metrics.total_crawled as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} URLs fetched)",
        success_rate, metrics.total_crawled, attempted
    );
}

/// Counts results by HTTP status code
pub fn count_by_status(report: &CrawlReport) -> HashMap<u16, usize> {
    let mut counts = HashMap::new();
    for result in &report.results {
        *counts.entry(result.status).or_insert(0) += 1;
    }
    counts
}
