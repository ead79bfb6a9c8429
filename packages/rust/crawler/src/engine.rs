//! Concurrent crawl orchestration across result pages.
//!
//! The engine probes the site once for the page count, then fans one
//! [`crate::worker::run_page`] task out per result page, each on its own
//! browser session. Page results are aggregated in completion order; a
//! failed page contributes nothing and never aborts its siblings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use reviewscout_shared::{CrawlConfig, RestaurantRecord, Result};

use crate::session::{SessionDriver, SessionFactory};
use crate::worker;

// ---------------------------------------------------------------------------
// CrawlStats
// ---------------------------------------------------------------------------

/// Summary of a completed crawl.
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// Page count reported by the site's pagination control.
    pub total_pages: u32,
    /// Pages that contributed records.
    pub pages_crawled: usize,
    /// Pages that aborted and contributed nothing.
    pub pages_failed: usize,
    /// Total duration of the crawl.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// CrawlEngine
// ---------------------------------------------------------------------------

/// Fans page workers out over a bounded pool of browser sessions.
pub struct CrawlEngine {
    factory: Arc<dyn SessionFactory>,
    config: CrawlConfig,
}

impl CrawlEngine {
    pub fn new(factory: Arc<dyn SessionFactory>, config: CrawlConfig) -> Self {
        Self { factory, config }
    }

    /// Crawl up to `max_pages` result pages for `location`.
    ///
    /// Infallible by contract: every fault degrades to a smaller (possibly
    /// empty) result and a log line. Cross-page ordering follows worker
    /// completion, not page number.
    #[instrument(skip_all, fields(location, max_pages))]
    pub async fn crawl(
        &self,
        location: &str,
        max_pages: u32,
        cancel: &CancellationToken,
    ) -> (CrawlStats, Vec<RestaurantRecord>) {
        let start = std::time::Instant::now();
        let mut stats = CrawlStats {
            total_pages: 0,
            pages_crawled: 0,
            pages_failed: 0,
            duration: Duration::ZERO,
        };

        if cancel.is_cancelled() {
            debug!("crawl cancelled before discovery");
            stats.duration = start.elapsed();
            return (stats, Vec::new());
        }

        let total_pages = match self.discover_total_pages(location).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "page discovery failed");
                stats.duration = start.elapsed();
                return (stats, Vec::new());
            }
        };
        stats.total_pages = total_pages;

        if total_pages == 0 {
            info!(location, "no listings found");
            stats.duration = start.elapsed();
            return (stats, Vec::new());
        }

        let effective = max_pages.min(total_pages);
        info!(
            total_pages,
            effective,
            concurrency = self.config.concurrency,
            "dispatching page workers"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks: JoinSet<Result<Vec<RestaurantRecord>>> = JoinSet::new();

        for page in 1..=effective {
            if cancel.is_cancelled() {
                debug!(page, "crawl cancelled, skipping remaining dispatch");
                break;
            }

            let factory = Arc::clone(&self.factory);
            let sem = Arc::clone(&semaphore);
            let config = self.config.clone();
            let token = cancel.clone();
            let location = location.to_string();

            tasks.spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                worker::run_page(factory.as_ref(), &location, page, &config, &token).await
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(page_records)) => {
                    stats.pages_crawled += 1;
                    records.extend(page_records);
                }
                Ok(Err(e)) => {
                    stats.pages_failed += 1;
                    warn!(error = %e, "page worker failed");
                }
                Err(e) => {
                    stats.pages_failed += 1;
                    warn!(error = %e, "page worker panicked");
                }
            }
        }

        stats.duration = start.elapsed();
        info!(
            pages_crawled = stats.pages_crawled,
            pages_failed = stats.pages_failed,
            records = records.len(),
            duration_ms = stats.duration.as_millis(),
            "crawl complete"
        );
        (stats, records)
    }

    /// Open a throwaway session just to read the result page count.
    async fn discover_total_pages(&self, location: &str) -> Result<u32> {
        let mut session = self.factory.open().await?;
        let outcome = probe(session.as_mut(), location).await;
        if let Err(e) = session.quit().await {
            warn!(error = %e, "discovery session teardown failed");
        }
        outcome
    }
}

async fn probe(session: &mut dyn SessionDriver, location: &str) -> Result<u32> {
    session.open_search(location).await?;
    session.total_pages().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedFactory, SessionScript, test_config};

    fn engine(factory: &ScriptedFactory) -> CrawlEngine {
        // The factory under test is shared via a second Arc so the counters
        // stay observable.
        CrawlEngine::new(
            Arc::new(ScriptedFactory {
                script: factory.script.clone(),
                counters: Arc::clone(&factory.counters),
            }),
            test_config(),
        )
    }

    #[tokio::test]
    async fn zero_total_pages_dispatches_no_workers() {
        let factory = ScriptedFactory::new(SessionScript {
            total_pages: 0,
            ..SessionScript::default()
        });
        let token = CancellationToken::new();

        let (stats, records) = engine(&factory).crawl("서면 국밥", 3, &token).await;

        assert!(records.is_empty());
        assert_eq!(stats.total_pages, 0);
        assert_eq!(stats.pages_crawled, 0);
        // Only the discovery session ever opened.
        assert_eq!(factory.counters.opened(), 1);
        assert_eq!(factory.counters.quit(), 1);
    }

    #[tokio::test]
    async fn effective_pages_is_min_of_site_and_cap() {
        let factory = ScriptedFactory::new(SessionScript {
            total_pages: 2,
            ..SessionScript::default()
        });
        let token = CancellationToken::new();

        let (stats, records) = engine(&factory).crawl("Seoul 강남 pasta", 3, &token).await;

        // Discovery plus exactly two page workers.
        assert_eq!(factory.counters.opened(), 3);
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.pages_crawled, 2);
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn max_pages_caps_a_deep_result_set() {
        let factory = ScriptedFactory::new(SessionScript {
            total_pages: 9,
            ..SessionScript::default()
        });
        let token = CancellationToken::new();

        let (stats, _) = engine(&factory).crawl("Seoul 강남 pasta", 2, &token).await;

        assert_eq!(factory.counters.opened(), 3);
        assert_eq!(stats.pages_crawled, 2);
    }

    #[tokio::test]
    async fn failed_page_excluded_but_siblings_aggregate() {
        let factory = ScriptedFactory::new(SessionScript {
            total_pages: 2,
            fail_goto_page: Some(2),
            ..SessionScript::default()
        });
        let token = CancellationToken::new();

        let (stats, records) = engine(&factory).crawl("Seoul 강남 pasta", 3, &token).await;

        assert_eq!(stats.pages_crawled, 1);
        assert_eq!(stats.pages_failed, 1);
        // Page 1's two listings survive; page 2 contributed nothing.
        assert_eq!(records.len(), 2);
        // Every session, failed worker included, was released.
        assert_eq!(factory.counters.quit(), factory.counters.opened());
    }

    #[tokio::test]
    async fn discovery_failure_yields_empty_result() {
        let factory = ScriptedFactory::new(SessionScript {
            fail_open_search: true,
            ..SessionScript::default()
        });
        let token = CancellationToken::new();

        let (stats, records) = engine(&factory).crawl("Seoul 강남 pasta", 3, &token).await;

        assert!(records.is_empty());
        assert_eq!(stats.pages_crawled, 0);
        assert_eq!(factory.counters.opened(), 1);
        assert_eq!(factory.counters.quit(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_token_opens_zero_sessions() {
        let factory = ScriptedFactory::new(SessionScript::default());
        let token = CancellationToken::new();
        token.cancel();

        let (stats, records) = engine(&factory).crawl("Seoul 강남 pasta", 3, &token).await;

        assert!(records.is_empty());
        assert_eq!(stats.pages_crawled, 0);
        assert_eq!(factory.counters.opened(), 0);
    }
}
