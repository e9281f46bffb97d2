//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl crawling engine.

use anyhow::Context;
use clap::Parser;
use ripple_crawl::config::{load_config_with_hash, Config};
use ripple_crawl::observer::{print_statistics, StatsObserver, TracingObserver};
use ripple_crawl::url::CrawlProfile;
use ripple_crawl::{normalize_seed, CrawlerBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a scoped, bounded web crawler
///
/// Ripple-Crawl fetches a site starting from a seed URL while respecting
/// robots.txt, scope rules, depth limits and a global fetch budget.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A scoped, bounded web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URL to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seed and show the crawl settings without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        return handle_dry_run(&config, &cli.seed);
    }

    handle_crawl(&config, &cli.seed).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and seed and prints the settings
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = normalize_seed(seed).context("Invalid seed URL")?;
    let profile = CrawlProfile::from_scope(&config.scope, &seed);

    println!("=== Ripple-Crawl Dry Run ===\n");

    println!("Seed: {}", seed);
    println!("Profile: {:?}", profile);
    println!("  Seed in scope: {}", profile.should_crawl(&seed));

    println!("\nCrawler Configuration:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Batch limit: {}", display_limit(config.crawler.pool_item_limit));
    println!("  Max crawl count: {}", display_limit(config.crawler.max_crawl_count));
    println!("  Max depth: {}", display_limit(config.crawler.max_depth));
    println!("  Max response size: {} bytes", config.crawler.max_response_size);
    println!(
        "  Delay between requests: {}ms",
        config.crawler.delay_between_requests
    );
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!("  Status policy: {:?}", config.crawler.status_policy);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    if let Some(proxy) = &config.proxy {
        println!("\nProxies:");
        println!("  Pool size: {}", proxy.ips.len());
        if let Some(store) = &proxy.store_path {
            println!("  Store: {}", store);
        }
    }

    // Building checks everything the run itself would check
    CrawlerBuilder::from_config(config).build()?;

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed: &str) -> anyhow::Result<()> {
    let stats = Arc::new(StatsObserver::new());

    let mut crawler = CrawlerBuilder::from_config(config)
        .observer(Arc::new(TracingObserver))
        .observer(stats.clone())
        .build()
        .context("Failed to set up crawler")?;

    let cancel = crawler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after in-flight requests");
            cancel.cancel();
        }
    });

    let summary = crawler.start_crawling(seed).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    print_statistics(&summary, &stats.snapshot());
    Ok(())
}

fn display_limit<T: std::fmt::Display>(limit: Option<T>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |l| l.to_string())
}
