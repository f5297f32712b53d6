//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawl engine:
//! - The deduplicating, depth- and origin-bounded frontier
//! - HTTP fetching with retry, backoff, and slow-host pacing
//! - HTML link extraction
//! - The worker pool that ties them together

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{crawl, CrawlReport, Crawler};
pub use fetcher::{
    backoff_delay, build_http_client, CrawlFailure, FailureCause, FetchError, FetchedPage,
    RawResponse, ReqwestTransport, RetryPolicy, RetryableFetcher, Transport, MAX_REDIRECTS,
};
pub use frontier::{Admission, Frontier, FrontierEntry, FrontierLease};
pub use parser::{parse_html, HtmlLinkExtractor, LinkExtractor, ParsedPage};
