//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the incremental listing crawler.
//! Logs go to stderr; stdout carries only the lines the scheduler parses.

use anyhow::Context;
use clap::Parser;
use listing_harvest::config::{compute_config_hash, resolve_config, Config, ExportMode};
use listing_harvest::output::{load_statistics, print_statistics};
use listing_harvest::{harvest, CrawlReport};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: an incremental news listing crawler
///
/// Walks a paginated article listing from the newest page backwards, stops
/// once it reaches articles it already knows, and rewrites JSON and CSV
/// exports of everything it has ever seen.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental news listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Re-walk from the first page, ignoring the boundary rule
    #[arg(long)]
    force_full: bool,

    /// Page limit for every crawl mode
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,

    /// Print the effective configuration and exit
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the state file and archive and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        println!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_effective_config(cli.config.as_deref())?;

    if cli.force_full {
        config.crawler.force_full_crawl = true;
    }
    if let Some(pages) = cli.max_pages {
        config.crawler.max_pages = pages;
        config.crawler.bootstrap_max_pages = pages;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the TOML file (if any), applies the environment, and validates
fn load_effective_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let hash = compute_config_hash(path)
                .with_context(|| format!("cannot read config file {}", path.display()))?;
            tracing::info!("Configuration file hash: {}", hash);
        }
        None => tracing::info!("No configuration file given, using defaults"),
    }

    let config = resolve_config(path, |name| std::env::var(name).ok())
        .context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Page template: {}", config.site.page_url_template);
    println!("  Item selector: {}", config.site.item_selector);
    println!("  Date selector: {}", config.site.date_selector);
    println!("  Paging selector: {}", config.site.pagination_selector);

    println!("\nCrawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Bootstrap max pages: {}", config.crawler.bootstrap_max_pages);
    println!("  Force full crawl: {}", config.crawler.force_full_crawl);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max attempts: {}", config.crawler.max_retries);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  On page error: {:?}", config.crawler.on_page_error);
    println!("  User agents: {}", config.crawler.user_agents.len());

    println!("\nOutput:");
    println!("  JSON: {}", config.output.json_path);
    println!("  CSV: {}", config.output.csv_path);
    println!("  State: {}", config.output.state_path);
    let mode = match config.output.export_mode {
        ExportMode::Full => "full",
        ExportMode::NewOnly => "new-only",
    };
    println!("  Export mode: {}", mode);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the state and archive
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("State: {}", config.output.state_path);
    println!("Archive: {}\n", config.output.json_path);

    let stats = load_statistics(
        Path::new(&config.output.state_path),
        Path::new(&config.output.json_path),
    )?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Crawling {}", config.site.base_url);

    let report = harvest(config).await?;
    print_summary(&report);

    Ok(())
}

/// Prints the lines the scheduling collaborator reads from stdout
fn print_summary(report: &CrawlReport) {
    println!(
        "SUCCESS: {} run stopped ({}) after {} pages, {} new articles, {} total",
        report.mode,
        report.phase,
        report.pages_fetched,
        report.new_items.len(),
        report.state.total_articles_crawled
    );
    println!("NEW_ARTICLES_COUNT={}", report.new_items.len());
    if let Some(date) = report.latest_new_date() {
        println!("LATEST_ARTICLE_DATE={}", date);
    }
}
