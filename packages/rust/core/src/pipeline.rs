//! End-to-end review acquisition: cache lookup → crawl → merge-and-persist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use reviewscout_crawler::{CrawlEngine, CrawlStats, SessionFactory};
use reviewscout_shared::{CrawlConfig, QueryKey, RestaurantRecord, Result};
use reviewscout_storage::DocumentStore;

use crate::gateway;

/// Configuration for one acquisition run.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Combined location+keyword query, e.g. `"Seoul 강남 pasta"`.
    pub query: String,
    /// Result-page cap for a cache-miss crawl.
    pub max_pages: u32,
    /// Crawl tuning passed through to the engine.
    pub crawl: CrawlConfig,
}

/// Where the returned records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireSource {
    /// Served from the document store without touching the site.
    Cache,
    /// Freshly crawled (and merged into the store).
    Crawl,
}

/// Result of [`acquire_reviews`].
#[derive(Debug)]
pub struct AcquireOutcome {
    /// Storage key derived from the query.
    pub key: QueryKey,
    /// The records handed to downstream ranking; possibly empty, never an
    /// error.
    pub records: Vec<RestaurantRecord>,
    pub source: AcquireSource,
    /// Crawl summary; `None` on the cache-hit path.
    pub crawl: Option<CrawlStats>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &AcquireOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _outcome: &AcquireOutcome) {}
}

/// Acquire restaurant records for a combined query.
///
/// A stored document for the query is returned as-is with zero crawl
/// operations; otherwise the engine crawls up to `max_pages` result pages and
/// the aggregate is merged into the store. Crawl and store faults degrade to
/// a smaller result with a warning; the only `Err` is query validation.
#[instrument(skip_all, fields(query = %config.query))]
pub async fn acquire_reviews(
    config: &AcquireConfig,
    store: &DocumentStore,
    factory: Arc<dyn SessionFactory>,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Result<AcquireOutcome> {
    let start = Instant::now();
    let key = QueryKey::parse(&config.query)?;

    info!(%key, "starting acquisition");

    progress.phase("Checking cache");
    match gateway::lookup(store, &key).await {
        Ok(Some(records)) => {
            info!(%key, records = records.len(), "cache hit");
            let outcome = AcquireOutcome {
                key,
                records,
                source: AcquireSource::Cache,
                crawl: None,
                elapsed: start.elapsed(),
            };
            progress.done(&outcome);
            return Ok(outcome);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "cache lookup failed, treating as miss"),
    }

    progress.phase("Crawling result pages");
    let engine = CrawlEngine::new(factory, config.crawl.clone());
    let (stats, records) = engine.crawl(&config.query, config.max_pages, cancel).await;

    progress.phase("Persisting results");
    if let Err(e) = gateway::merge_and_persist(store, &key, records.clone()).await {
        warn!(error = %e, "persist failed, returning crawled records anyway");
    }

    let outcome = AcquireOutcome {
        key,
        records,
        source: AcquireSource::Crawl,
        crawl: Some(stats),
        elapsed: start.elapsed(),
    };

    info!(
        key = %outcome.key,
        records = outcome.records.len(),
        elapsed_ms = outcome.elapsed.as_millis(),
        "acquisition complete"
    );
    progress.done(&outcome);
    Ok(outcome)
}
