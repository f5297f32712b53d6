//! Output module for crawl results and statistics
//!
//! This module handles:
//! - Collecting per-URL results as workers complete them
//! - Deriving aggregate metrics for a finished run
//! - Printing a console summary

mod collector;
pub mod stats;

pub use collector::{CrawlResult, ResultCollector};
pub use stats::{count_by_status, print_statistics, CrawlMetrics};
