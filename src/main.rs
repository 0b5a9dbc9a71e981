//! kb-crawler main entry point
//!
//! This is the command-line interface for the single-site knowledge-base
//! crawler.

use anyhow::Context;
use clap::Parser;
use kb_crawler::config::{load_config_with_hash, validate, Config};
use kb_crawler::crawler::{
    CrawlEngine, HttpFetch, RemoteRendererLauncher, RendererLauncher, ReqwestFetcher,
};
use kb_crawler::output::{print_statistics, write_report, ReportStatistics};
use kb_crawler::url::normalize_url;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// kb-crawler: a single-site knowledge-base crawler
///
/// Crawls one site from a seed URL, extracts readable content from static
/// or script-rendered pages, and writes the classified records as JSON.
#[derive(Parser, Debug)]
#[command(name = "kb-crawler")]
#[command(version)]
#[command(about = "A single-site knowledge-base crawler", long_about = None)]
struct Cli {
    /// URL to start from; `https://` is assumed when no scheme is given
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of records to collect (overrides the config file)
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Minimum delay between requests in milliseconds (overrides the config file)
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Directory the JSON report is written to (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;
    let seed = normalize_url(&with_scheme(&cli.seed))
        .with_context(|| format!("invalid seed URL '{}'", cli.seed))?;

    let fetcher: Arc<dyn HttpFetch> =
        Arc::new(ReqwestFetcher::new().context("failed to build HTTP client")?);
    let launcher = match &config.renderer.endpoint {
        Some(endpoint) => {
            tracing::info!("Using rendering service at {}", endpoint);
            let launcher = RemoteRendererLauncher::new(endpoint)?;
            Some(Arc::new(launcher) as Arc<dyn RendererLauncher>)
        }
        None => {
            tracing::info!("No rendering service configured, static fetching only");
            None
        }
    };

    let (log_tx, mut log_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = CrawlEngine::new(&config, seed.as_str(), fetcher, launcher)?
        .with_log_channel(log_tx);
    let handle = engine.spawn();

    let quiet = cli.quiet;
    let printer = tokio::spawn(async move {
        while let Some(line) = log_rx.recv().await {
            if !quiet {
                println!("{}", line);
            }
        }
    });

    let progress = handle.progress_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current page");
            progress.cancel();
        }
    });

    let outcome = handle.join().await?;
    // The engine's sender is dropped with the engine, which ends the printer
    let _ = printer.await;

    let directory = PathBuf::from(&config.output.directory);
    let path = write_report(&outcome.report, &seed, &directory)
        .with_context(|| format!("failed to write report to {}", directory.display()))?;

    println!();
    println!(
        "Crawl {}: {} items from {} pages",
        outcome.status,
        outcome.report.items.len(),
        outcome.visited.len()
    );
    println!("Results saved to: {}", path.display());
    println!();
    print_statistics(&ReportStatistics::from_report(&outcome.report));

    Ok(())
}

/// Loads the config file if given, applies CLI overrides and validates
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawler.base_delay_ms = delay_ms;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }

    validate(&config)?;
    Ok(config)
}

/// Prepends `https://` when the seed has no scheme
fn with_scheme(seed: &str) -> String {
    let seed = seed.trim();
    if seed.starts_with("http://") || seed.starts_with("https://") {
        seed.to_string()
    } else {
        format!("https://{}", seed)
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kb_crawler=info,warn"),
            1 => EnvFilter::new("kb_crawler=debug,info"),
            2 => EnvFilter::new("kb_crawler=trace,debug"),
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
