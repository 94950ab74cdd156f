//! Link-Ripple main entry point
//!
//! This is the command-line interface for the Link-Ripple link-graph harvester.

use anyhow::Context;
use clap::Parser;
use link_ripple::config::{load_config_with_hash, Config};
use link_ripple::crawler::{count_frontier_entries, CrawlPipeline};
use link_ripple::output::print_report;
use link_ripple::RippleError;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Link-Ripple: a concurrent link-graph harvester
///
/// Reads page names from a frontier file, fetches every page's outbound
/// links from a MediaWiki-style API, and writes one record per page.
#[derive(Parser, Debug)]
#[command(name = "link-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent link-graph harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Frontier file to crawl, overriding the configuration
    #[arg(short, long, value_name = "PATH")]
    frontier: Option<PathBuf>,

    /// Number of workers, overriding the configuration
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(frontier) = cli.frontier {
        config.crawler.frontier_path = frontier;
    }
    if let Some(workers) = cli.workers {
        config.pool.workers = workers;
    }
    link_ripple::config::validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        return handle_dry_run(&config).await;
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_ripple=info,warn"),
            1 => EnvFilter::new("link_ripple=debug,info"),
            2 => EnvFilter::new("link_ripple=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Link-Ripple Dry Run ===\n");

    println!("HTTP Client:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Max idle connections: {}", config.http.max_idle_connections);
    println!(
        "  Max connections per host: {}",
        config.http.max_connections_per_host
    );
    println!("  Idle timeout: {}s", config.http.idle_timeout_secs);
    println!("  User agent: {}", config.http.user_agent);
    println!("  Backoff base: {}ms", config.http.backoff_base_ms);

    println!("\nLink API:");
    println!("  Endpoint: {}", config.api.endpoint);
    println!("  Namespace: {}", config.api.namespace);
    println!("  Page limit: {}", config.api.page_limit);
    println!("  Max attempts: {}", config.api.max_attempts);

    println!("\nWorker Pool:");
    println!("  Workers: {}", config.pool.workers);
    println!("  Queue capacity: {}", config.pool.queue_capacity);
    println!("  Output capacity: {}", config.pool.output_capacity);

    println!("\nRun:");
    println!("  Frontier: {}", config.crawler.frontier_path.display());
    println!("  Frontier buffer: {}", config.crawler.frontier_buffer);
    println!("  Deadline: {}s", config.crawler.deadline_secs);
    match &config.output.records_path {
        Some(path) => println!("  Records: {}", path.display()),
        None => println!("  Records: log only"),
    }

    let entries = count_frontier_entries(&config.crawler.frontier_path)
        .await
        .with_context(|| {
            format!(
                "Failed to read frontier {}",
                config.crawler.frontier_path.display()
            )
        })?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} pages", entries);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl-C stops the run; in-flight work fails fast and is still reported
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl");
            interrupt.cancel();
        }
    });

    let pipeline = CrawlPipeline::new(config).context("Failed to set up crawl")?;
    match pipeline.run(cancel).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            if let RippleError::Frontier { report, .. } = &e {
                print_report(report);
            }
            Err(e.into())
        }
    }
}
