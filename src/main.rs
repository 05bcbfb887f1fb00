//! Jobsift main entry point
//!
//! This is the command-line interface for the Jobsift job-posting crawler.

use anyhow::Context;
use clap::Parser;
use jobsift::config::{load_config_with_hash, validate, Config, OutputFormat};
use jobsift::crawler::crawl;
use jobsift::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Jobsift: a bounded job-posting crawler
///
/// Jobsift walks a paginated job listing, visits each posting once and
/// writes one structured record per posting until the job budget is spent.
#[derive(Parser, Debug)]
#[command(name = "jobsift")]
#[command(version)]
#[command(about = "A bounded job-posting crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Listing page to start from
    #[arg(long)]
    search_url: Option<String>,

    /// Maximum number of records to emit (1-1000)
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Maximum number of concurrent page fetches
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Where to write records
    #[arg(short, long)]
    output: Option<String>,

    /// Record format: jsonl or sqlite
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jobsift=info,warn"),
            1 => EnvFilter::new("jobsift=debug,info"),
            2 => EnvFilter::new("jobsift=trace,debug"),
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

/// Command-line flags win over file values
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.search_url {
        config.crawler.search_url = url.clone();
    }
    if let Some(max_jobs) = cli.max_jobs {
        config.crawler.max_jobs = max_jobs;
    }
    if let Some(concurrency) = cli.max_concurrency {
        config.crawler.max_concurrency = concurrency;
    }
    if let Some(path) = &cli.output {
        config.output.records_path = path.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Jobsift Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Search URL: {}", config.crawler.search_url);
    println!("  Site domain: {}", config.crawler.site_domain);
    println!("  Max jobs: {}", config.crawler.max_jobs);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Retries: {}", config.fetch.max_retries);
    println!("  Retry delay: {}ms", config.fetch.retry_delay_ms);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Format: {}", config.output.format);

    if !config.seed.is_empty() {
        println!("\nExtra seeds ({}):", config.seed.len());
        for seed in &config.seed {
            println!(
                "  - {} [{}]",
                seed.url,
                seed.label.as_deref().unwrap_or("unlabeled")
            );
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} for at most {} jobs",
        config.crawler.search_url,
        config.crawler.max_jobs
    );

    match crawl(&config).await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
