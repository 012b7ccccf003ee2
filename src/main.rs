//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet crawler.

use anyhow::Context;
use clap::Parser;
use driftnet::config::{compute_config_hash, parse_config, validate, Config, ConfigOverrides};
use driftnet::control::Coordinator;
use driftnet::crawler::{HttpTransport, Worker};
use driftnet::storage::{MockStore, SqliteStore, Store};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Driftnet: a recursive web crawler
///
/// Driftnet starts from a set of seed URLs, follows links breadth-first with
/// a randomized frontier, extracts readable text and stores every page it
/// could parse. Stop it with Ctrl-C; in-flight pages are finished first.
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version)]
#[command(about = "A recursive web crawler", long_about = None)]
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

    /// Seed URL, replacing the configured seeds (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<u32>,

    /// Maximum link depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Host discovered links must belong to, replacing the configured list (repeatable)
    #[arg(long = "whitelist", value_name = "HOST")]
    whitelist: Vec<String>,

    /// Proxy every request is routed through
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Discard results instead of writing them to the database
    #[arg(long)]
    mock_store: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            seeds: self.seeds.clone(),
            workers: self.workers,
            max_depth: self.max_depth,
            whitelisted_hosts: self.whitelist.clone(),
            proxy: self.proxy.clone(),
            timeout_secs: self.timeout,
            mock_store: self.mock_store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = parse_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let config_hash = compute_config_hash(&cli.config)?;

    config.apply_overrides(cli.overrides());
    validate(&config).context("invalid configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if config.store.mock {
        handle_crawl(&config, MockStore::new()).await?;
    } else {
        handle_crawl(&config, SqliteStore::new(&config.store.database_path)).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated plan
fn handle_dry_run(config: &Config) {
    println!("=== Driftnet Dry Run ===\n");

    println!("Crawler:");
    println!("  Workers: {}", config.crawler.workers);
    match config.crawler.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }
    println!(
        "  Random index threshold: {}",
        config.crawler.random_index_threshold
    );
    println!("  Idle interval: {}ms", config.crawler.idle_interval_ms);

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!(
        "  Proxy: {}",
        config.http.proxy.as_deref().unwrap_or("none")
    );

    println!("\nStore:");
    if config.store.mock {
        println!("  Mock (results are discarded)");
    } else {
        println!("  Database: {}", config.store.database_path);
    }

    match &config.crawler.whitelisted_hosts {
        Some(hosts) => {
            println!("\nWhitelisted hosts ({}):", hosts.len());
            for host in hosts {
                println!("  - {}", host);
            }
        }
        None => println!("\nWhitelisted hosts: any"),
    }

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows page counts from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.store.database_path);

    let mut store = SqliteStore::new(&config.store.database_path);
    store.connect()?;

    println!("Pages stored: {}", store.count_pages()?);
    println!("\nBy content type:");
    for (content_type, count) in store.count_by_content_type()? {
        println!("  {:<20} {}", content_type, count);
    }

    store.close()?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl<S: Store>(config: &Config, store: S) -> anyhow::Result<()> {
    let transport = Arc::new(HttpTransport::new(&config.http)?);

    let mut coordinator = Coordinator::new(config.crawl_config(), store);
    coordinator.seed(config.crawler.seeds.iter().cloned());

    let connections: Vec<_> = (0..config.crawler.workers)
        .map(|_| coordinator.connect())
        .collect();
    let handle = coordinator.run().context("failed to start the crawl")?;

    let idle_interval = Duration::from_millis(config.crawler.idle_interval_ms);
    for (id, connection) in connections.into_iter().enumerate() {
        let worker = Worker::new(id, connection, transport.clone(), idle_interval);
        tokio::spawn(worker.run());
    }
    tracing::info!(
        "Crawling from {} seeds with {} workers",
        config.crawler.seeds.len(),
        config.crawler.workers
    );

    let stop = handle.stop_signal();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => stop.stop(),
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let (mut store, summary) = handle.await_completion().await?;
    store.close()?;

    tracing::info!(
        "Crawl finished: {} stored, {} failed, {} visited, {} still queued",
        summary.successes,
        summary.failures,
        summary.visited,
        summary.pending
    );

    Ok(())
}
