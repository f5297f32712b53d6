//! Ripple crawler main entry point
//!
//! Command-line interface for the bounded same-origin crawler.

use anyhow::{Context, Result};
use clap::Parser;
use ripple_crawler::config::{load_config_with_hash, validate, Config};
use ripple_crawler::crawler::crawl;
use ripple_crawler::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple: a bounded, same-origin web crawler
///
/// Crawls every page reachable from SEED on the seed's own origin, up to a
/// maximum link depth, retrying transient failures and pacing slow hosts.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawler")]
#[command(version)]
#[command(about = "A bounded, same-origin web crawler", long_about = None)]
struct Cli {
    /// Absolute http(s) URL to start from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the maximum link depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Override the number of concurrent workers
    #[arg(long)]
    concurrency: Option<u32>,

    /// Print crawled pages whose URL or title contains KEYWORD
    #[arg(short, long, value_name = "KEYWORD")]
    search: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrency = concurrency;
    }
    validate(&config).context("invalid configuration after command-line overrides")?;

    if cli.dry_run {
        print_dry_run(&cli.seed, &config);
        return Ok(());
    }

    let report = crawl(&cli.seed, config)
        .await
        .with_context(|| format!("crawl of {} failed", cli.seed))?;

    if !cli.quiet {
        print_statistics(&report);
    }

    if let Some(keyword) = &cli.search {
        let hits = report.search(keyword);
        println!("\nSearch results for \"{}\" ({}):", keyword, hits.len());
        for hit in hits {
            println!(
                "  - {} [{}] {}",
                hit.url,
                hit.status,
                hit.title.as_deref().unwrap_or("(untitled)")
            );
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawler=info,warn"),
            1 => EnvFilter::new("ripple_crawler=debug,info"),
            2 => EnvFilter::new("ripple_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_dry_run(seed: &str, config: &Config) {
    let crawler = &config.crawler;

    println!("=== Ripple Dry Run ===\n");
    println!("Seed: {}\n", seed);

    println!("Crawler Configuration:");
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Workers: {}", crawler.max_concurrency);
    println!("  Timeout: {}ms", crawler.timeout);
    println!("  Max retries: {}", crawler.max_retries);
    println!("  Retry delay: {}ms", crawler.retry_delay);
    println!("  Delay between requests: {}ms", crawler.delay_between_requests);
    println!("  Slow host threshold: {}ms", crawler.slow_host_threshold);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("\n✓ Configuration is valid");
}
