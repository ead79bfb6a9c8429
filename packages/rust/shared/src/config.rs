//! Application configuration for reviewscout.
//!
//! User config lives at `~/.reviewscout/reviewscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reviewscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reviewscout";

/// Default document store file name inside the config directory.
const DB_FILE_NAME: &str = "reviews.db";

// ---------------------------------------------------------------------------
// Config structs (matching reviewscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Target site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Wait and retry tuning for browser sessions.
    #[serde(default)]
    pub waits: WaitsConfig,

    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum result pages crawled per query.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Concurrent browser sessions.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_max_pages() -> u32 {
    3
}
fn default_concurrency() -> u32 {
    5
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Entry URL for the map search page.
    #[serde(default = "default_search_url")]
    pub search_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
        }
    }
}

fn default_search_url() -> String {
    "https://map.kakao.com/".into()
}

/// `[waits]` section.
///
/// Element waits are bounded retries (`attempts` x `delay_ms`) instead of
/// open-ended sleeps; settle delays cover renders no DOM signal announces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitsConfig {
    /// Retry attempts while waiting for an element.
    #[serde(default = "default_wait_attempts")]
    pub attempts: u32,

    /// Delay between wait attempts, in milliseconds.
    #[serde(default = "default_wait_delay_ms")]
    pub delay_ms: u64,

    /// Settle delay after activating a pagination link.
    #[serde(default = "default_settle_ms")]
    pub page_settle_ms: u64,

    /// Settle delay before reading the listing HTML.
    #[serde(default = "default_listing_settle_ms")]
    pub listing_settle_ms: u64,

    /// Settle delay after opening a listing's review panel.
    #[serde(default = "default_settle_ms")]
    pub panel_settle_ms: u64,

    /// Delay between clicks of the "more reviews" control.
    #[serde(default = "default_expand_delay_ms")]
    pub expand_delay_ms: u64,

    /// Maximum clicks of the "more reviews" control per listing.
    #[serde(default = "default_expand_cap")]
    pub expand_cap: u32,
}

impl Default for WaitsConfig {
    fn default() -> Self {
        Self {
            attempts: default_wait_attempts(),
            delay_ms: default_wait_delay_ms(),
            page_settle_ms: default_settle_ms(),
            listing_settle_ms: default_listing_settle_ms(),
            panel_settle_ms: default_settle_ms(),
            expand_delay_ms: default_expand_delay_ms(),
            expand_cap: default_expand_cap(),
        }
    }
}

fn default_wait_attempts() -> u32 {
    20
}
fn default_wait_delay_ms() -> u64 {
    500
}
fn default_settle_ms() -> u64 {
    1000
}
fn default_listing_settle_ms() -> u64 {
    200
}
fn default_expand_delay_ms() -> u64 {
    500
}
fn default_expand_cap() -> u32 {
    10
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the document store database. Empty means
    /// `~/.reviewscout/reviews.db`.
    #[serde(default)]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Bounded retry policy for element waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Lookup attempts before giving up.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

/// Runtime crawl configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum result pages crawled per query.
    pub max_pages: u32,
    /// Concurrent browser sessions.
    pub concurrency: usize,
    /// Entry URL for the map search page.
    pub search_url: String,
    /// Element wait policy.
    pub wait: WaitPolicy,
    /// Settle delay after a pagination click.
    pub page_settle: Duration,
    /// Settle delay before reading the listing HTML.
    pub listing_settle: Duration,
    /// Settle delay after opening a review panel.
    pub panel_settle: Duration,
    /// Delay between "more reviews" clicks.
    pub expand_delay: Duration,
    /// Maximum "more reviews" clicks per listing.
    pub expand_cap: u32,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_pages: config.defaults.max_pages,
            concurrency: config.defaults.concurrency as usize,
            search_url: config.site.search_url.clone(),
            wait: WaitPolicy {
                attempts: config.waits.attempts,
                delay: Duration::from_millis(config.waits.delay_ms),
            },
            page_settle: Duration::from_millis(config.waits.page_settle_ms),
            listing_settle: Duration::from_millis(config.waits.listing_settle_ms),
            panel_settle: Duration::from_millis(config.waits.panel_settle_ms),
            expand_delay: Duration::from_millis(config.waits.expand_delay_ms),
            expand_cap: config.waits.expand_cap,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reviewscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reviewscout/reviewscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the document store path: the configured value, or the default
/// location inside the config directory when unset.
pub fn db_path(config: &AppConfig) -> Result<PathBuf> {
    if config.store.db_path.is_empty() {
        Ok(config_dir()?.join(DB_FILE_NAME))
    } else {
        Ok(PathBuf::from(&config.store.db_path))
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| ScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
