//! Sitemap-Walker main entry point
//!
//! This is the command-line interface for the Sitemap-Walker discovery engine.

use anyhow::{Context, Result};
use clap::Parser;
use sitemap_walker::config::load_config;
use sitemap_walker::output::{ItemWriter, OutputFormat};
use sitemap_walker::{Options, SitemapFetcher};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sitemap-Walker: stream every URL a website lists in its sitemaps
///
/// The walker discovers sitemaps through robots.txt or well-known locations,
/// follows sitemap indexes breadth-first, and prints each URL as soon as it is
/// decoded. Plain and gzip-compressed sitemaps are both supported.
#[derive(Parser, Debug)]
#[command(name = "sitemap-walker")]
#[command(version = "1.0.0")]
#[command(about = "Stream every URL listed in a website's sitemaps", long_about = None)]
struct Cli {
    /// Website or sitemap URL (scheme defaults to https)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum sitemap index depth (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum number of sitemap files to fetch (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_sitemaps: Option<usize>,

    /// Maximum number of URLs to print (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_urls: Option<usize>,

    /// Skip sitemaps that answer with a non-2xx status instead of failing
    #[arg(long)]
    allow_non_success: bool,

    /// Do not fetch or honor robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// User-Agent header to send
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Per-request timeout in milliseconds, body included (0 = none)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Only print URLs matching this regular expression (repeatable)
    #[arg(long, value_name = "REGEX")]
    include: Vec<String>,

    /// Never print URLs matching this regular expression (repeatable)
    #[arg(long, value_name = "REGEX")]
    exclude: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Line)]
    format: OutputFormat,

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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let options = build_options(&cli)?;
    let fetcher = SitemapFetcher::new(options).context("Invalid walk options")?;

    // Ctrl-C stops the walk at its next checkpoint
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping walk");
            on_interrupt.cancel();
        }
    });

    let mut writer = ItemWriter::new(BufWriter::new(io::stdout()), cli.format);
    let result = fetcher
        .walk(&cancel, &cli.url, |item| writer.write_item(&item))
        .await;
    writer.flush().context("Failed to flush output")?;

    result.with_context(|| format!("Sitemap walk failed for {}", cli.url))?;
    tracing::info!("Printed {} URLs", writer.written());
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only items. `RUST_LOG` wins when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("sitemap_walker=info,warn"),
                1 => EnvFilter::new("sitemap_walker=debug,info"),
                2 => EnvFilter::new("sitemap_walker=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds walk options from the optional config file and the command-line flags
fn build_options(cli: &Cli) -> Result<Options> {
    let mut options = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Options::default(),
    };

    if let Some(max_depth) = cli.max_depth {
        options.max_depth = max_depth;
    }
    if let Some(max_sitemaps) = cli.max_sitemaps {
        options.max_sitemaps = max_sitemaps;
    }
    if let Some(max_urls) = cli.max_urls {
        options.max_urls = max_urls;
    }
    options.allow_non_success |= cli.allow_non_success;
    options.ignore_robots |= cli.ignore_robots;
    if let Some(user_agent) = &cli.user_agent {
        options.user_agent = Some(user_agent.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        options.per_request_timeout = Duration::from_millis(timeout_ms);
    }
    if !cli.include.is_empty() {
        options.include = cli.include.clone();
    }
    if !cli.exclude.is_empty() {
        options.exclude = cli.exclude.clone();
    }

    Ok(options)
}
