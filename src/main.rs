//! Knowledge Harvester main entry point
//!
//! This is the command-line interface for the Knowledge Harvester crawler.

use anyhow::Context;
use clap::Parser;
use knowledge_harvester::config::{load_config_with_hash, validate, Config};
use knowledge_harvester::crawler::Crawler;
use knowledge_harvester::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Knowledge Harvester: a focused crawler for education and government knowledge
///
/// Knowledge Harvester walks the web from a set of seed URLs, keeps pages from
/// trusted or topically relevant sources, and aggregates their structured
/// content into one markdown document per domain.
#[derive(Parser, Debug)]
#[command(name = "knowledge-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A focused knowledge crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Replace the configured seeds (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the configured maximum depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the configured worker count
    #[arg(long, value_name = "N")]
    workers: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if apply_overrides(&mut config, &cli) {
        validate(&config).context("Invalid command-line override")?;
    }

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("knowledge_harvester=info,warn"),
            1 => EnvFilter::new("knowledge_harvester=debug,info"),
            2 => EnvFilter::new("knowledge_harvester=trace,debug"),
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

/// Applies command-line overrides; returns true if anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;

    if !cli.seeds.is_empty() {
        config.crawler.seeds = cli.seeds.clone();
        changed = true;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
        changed = true;
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
        changed = true;
    }

    changed
}

/// Handles the --dry-run mode: shows the effective configuration
fn print_dry_run(config: &Config) {
    println!("=== Knowledge Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!(
        "  Minimum paragraph length: {}",
        config.crawler.min_paragraph_length
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\nUser Agent:");
    println!("  Crawler: {}", config.user_agent.crawler_user_agent());
    if let Some(browser) = &config.user_agent.browser_user_agent {
        println!("  Browser: {}", browser);
    }

    println!("\nOutput:");
    println!("  Domain documents: {}", config.output.output_dir);
    println!("  Visited log: {}", config.output.visited_log_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    let filters = &config.filters;
    println!("\nFilters:");
    println!("  Blocked ({}): {}", filters.blocked.len(), filters.blocked.join(", "));
    println!(
        "  Trust hints ({}): {}",
        filters.trust_hints.len(),
        filters.trust_hints.join(", ")
    );
    println!(
        "  Relevance keywords ({}): {}",
        filters.relevance_keywords.len(),
        filters.relevance_keywords.join(", ")
    );
    println!(
        "  Media markers ({}): {}",
        filters.media_markers.len(),
        filters.media_markers.join(", ")
    );

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.crawler.seeds.len()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let crawler = Crawler::new(config, config_hash).context("Failed to initialize crawler")?;

    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            stop.stop();
        }
    });

    match crawler.run().await {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("Crawl halted")
        }
    }
}
