//! Shared types, error model, and configuration for reviewscout.
//!
//! This crate is the foundation depended on by all other reviewscout crates.
//! It provides:
//! - [`ScoutError`] and the crate-wide [`Result`] alias
//! - Domain types ([`QueryKey`], [`ReviewEntry`], [`RestaurantRecord`],
//!   [`StoredDocument`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, SiteConfig, StoreConfig, WaitPolicy, WaitsConfig,
    config_dir, config_file_path, db_path, init_config, load_config, load_config_from,
};
pub use error::{Result, ScoutError};
pub use types::{QueryKey, REVIEW_PLACEHOLDER, RestaurantRecord, ReviewEntry, StoredDocument};
