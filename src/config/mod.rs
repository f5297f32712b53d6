//! Configuration module
//!
//! Loads, parses, and validates TOML configuration files. Every key is
//! optional, so an absent file and an empty file both mean "all defaults".
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, UserAgentConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_crawler_config, MAX_CONCURRENCY_LIMIT};
