//! Browser-automation crawling for restaurant listings and their reviews.
//!
//! This crate provides:
//! - [`session`] — the [`SessionDriver`]/[`SessionFactory`] seam between
//!   crawl logic and browser automation
//! - [`chromium`] — the chromiumoxide-backed production driver
//! - [`extract`] — HTML field extraction for listings and review panels
//! - [`worker`] — one result page crawled over one dedicated session
//! - [`engine`] — concurrent fan-out across result pages

pub mod chromium;
pub mod engine;
pub mod extract;
pub mod session;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use chromium::{ChromiumFactory, ChromiumSession};
pub use engine::{CrawlEngine, CrawlStats};
pub use extract::{ListingInfo, parse_listings, parse_reviews};
pub use session::{SessionDriver, SessionFactory};
pub use worker::run_page;
