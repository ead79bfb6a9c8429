//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use reviewscout_core::pipeline::{
    AcquireConfig, AcquireOutcome, AcquireSource, ProgressReporter, acquire_reviews,
};
use reviewscout_crawler::ChromiumFactory;
use reviewscout_shared::{AppConfig, CrawlConfig, QueryKey, db_path, init_config, load_config};
use reviewscout_storage::DocumentStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// reviewscout — crawl and cache restaurant reviews per query.
#[derive(Parser)]
#[command(
    name = "reviewscout",
    version,
    about = "Crawl map.kakao.com restaurant reviews for a location+keyword query, with a local cache.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Acquire reviews for a query, crawling on a cache miss.
    Acquire {
        /// Combined location+keyword query, e.g. "Seoul 강남 pasta".
        query: String,

        /// Maximum result pages to crawl (defaults to the configured value).
        #[arg(short, long)]
        max_pages: Option<u32>,

        /// Document store path (defaults to ~/.reviewscout/reviews.db).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Check the cache for a query without crawling.
    Lookup {
        /// Combined location+keyword query.
        query: String,

        /// Document store path (defaults to ~/.reviewscout/reviews.db).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reviewscout=info",
        1 => "reviewscout=debug",
        _ => "reviewscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Acquire {
            query,
            max_pages,
            db,
        } => cmd_acquire(&query, max_pages, db).await,
        Command::Lookup { query, db } => cmd_lookup(&query, db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_acquire(query: &str, max_pages: Option<u32>, db: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let crawl = CrawlConfig::from(&config);
    let max_pages = max_pages.unwrap_or(crawl.max_pages);
    let store_path = resolve_db(&config, db)?;

    info!(query, max_pages, db = %store_path.display(), "acquiring reviews");

    let store = DocumentStore::open(&store_path).await?;
    let factory = Arc::new(ChromiumFactory::new(crawl.clone()));

    let token = CancellationToken::new();
    let ctrlc_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight pages");
            ctrlc_token.cancel();
        }
    });

    let acquire_config = AcquireConfig {
        query: query.to_string(),
        max_pages,
        crawl,
    };

    let reporter = CliProgress::new();
    let outcome = acquire_reviews(&acquire_config, &store, factory, &reporter, &token).await?;

    println!();
    println!("  Query:   {}", outcome.key.normalized);
    println!("  Index:   {}", outcome.key.region);
    println!(
        "  Source:  {}",
        match outcome.source {
            AcquireSource::Cache => "cache",
            AcquireSource::Crawl => "crawl",
        }
    );
    println!("  Records: {}", outcome.records.len());
    if let Some(stats) = &outcome.crawl {
        println!(
            "  Pages:   {} crawled, {} failed (site reported {})",
            stats.pages_crawled, stats.pages_failed, stats.total_pages
        );
    }
    println!("  Time:    {:.1}s", outcome.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_lookup(query: &str, db: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let store_path = resolve_db(&config, db)?;
    let key = QueryKey::parse(query)?;

    let store = DocumentStore::open(&store_path).await?;
    match reviewscout_core::gateway::lookup(&store, &key).await? {
        Some(records) => {
            println!("{}: {} cached record(s)", key.normalized, records.len());
            for record in &records {
                println!(
                    "  {} ({}): {} review(s)",
                    record.name,
                    record.score,
                    record.reviews.len()
                );
            }
        }
        None => println!("{}: no cached results", key.normalized),
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// CLI override beats the configured store path.
fn resolve_db(config: &AppConfig, db: Option<PathBuf>) -> Result<PathBuf> {
    match db {
        Some(path) => Ok(path),
        None => Ok(db_path(config)?),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _outcome: &AcquireOutcome) {
        self.spinner.finish_and_clear();
    }
}
