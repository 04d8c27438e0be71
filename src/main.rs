//! Ripple-Frontier main entry point
//!
//! This is the command-line interface for the Ripple-Frontier crawl engine.

use anyhow::{Context, Result};
use clap::Parser;
use ripple_frontier::config::{load_config_with_hash, Config};
use ripple_frontier::crawler::Coordinator;
use ripple_frontier::output::print_summary;
use ripple_frontier::Frontier;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Ripple-Frontier: a polite crawl frontier and scheduler
///
/// Ripple-Frontier admits seed URLs, deduplicates and prioritizes them,
/// keeps every domain inside its politeness window, and follows discovered
/// links up to the configured depth.
#[derive(Parser, Debug)]
#[command(name = "ripple-frontier")]
#[command(version)]
#[command(about = "A polite crawl frontier and scheduler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Validate config and seeds without crawling
    #[arg(long)]
    dry_run: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.seeds)
    } else {
        handle_crawl(config, &cli.seeds, cli.json).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_frontier=info,warn"),
            1 => EnvFilter::new("ripple_frontier=debug,info"),
            2 => EnvFilter::new("ripple_frontier=trace,debug"),
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

/// Handles the --dry-run mode: shows the settings and which seeds would be admitted
fn handle_dry_run(config: &Config, extra_seeds: &[String]) -> Result<()> {
    println!("=== Ripple-Frontier Dry Run ===\n");

    println!("Frontier:");
    println!("  Max depth: {}", config.frontier.max_depth);
    println!("  Max retries: {}", config.frontier.max_retries);
    println!("  Domain spacing: {}ms", config.frontier.min_domain_spacing);

    println!("\nScheduler:");
    println!("  Workers: {}", config.scheduler.max_workers);
    println!("  Batch size: {}", config.scheduler.batch_size);
    println!(
        "  Follow external links: {}",
        config.scheduler.follow_external_links
    );
    println!("  Fetch timeout: {}s", config.scheduler.fetch_timeout);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    if !config.filters.allowed_domains.is_empty() {
        println!(
            "\nAllowed Domains ({}):",
            config.filters.allowed_domains.len()
        );
        for domain in &config.filters.allowed_domains {
            println!("  - {}", domain);
        }
    }

    let frontier = Frontier::from_config(config)?;
    let seeds: Vec<&String> = config.seeds.iter().chain(extra_seeds).collect();
    let accepted = frontier.validate_urls(&seeds);

    println!("\nSeeds ({} given, {} accepted):", seeds.len(), accepted.len());
    for url in &accepted {
        println!("  * {}", url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, extra_seeds: &[String], json: bool) -> Result<()> {
    let coordinator = Coordinator::new(config).context("failed to build crawler")?;
    if coordinator.seed(extra_seeds) == 0 {
        tracing::warn!("No seed URLs were admitted, nothing to crawl");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping dispatch");
                cancel.cancel();
            }
        });
    }

    let summary = coordinator.run(cancel).await;

    if json {
        println!("{}", summary.to_json()?);
    } else {
        print_summary(&summary);
    }

    if !summary.is_complete() {
        tracing::info!(
            remaining = summary.status.queue_size,
            "Crawl stopped before the frontier drained"
        );
    }
    Ok(())
}
