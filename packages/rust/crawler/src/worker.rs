//! Page worker: one result page crawled over one dedicated session.

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use reviewscout_shared::{CrawlConfig, RestaurantRecord, Result, ReviewEntry, ScoutError};

use crate::extract;
use crate::session::{SessionDriver, SessionFactory};

/// Crawl one result page and return its records in listing order.
///
/// The session is quit before returning on every path, fault paths included.
/// An `Err` means the whole page contributed nothing; the engine counts it
/// and moves on.
#[instrument(skip_all, fields(page))]
pub async fn run_page(
    factory: &dyn SessionFactory,
    location: &str,
    page: u32,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> Result<Vec<RestaurantRecord>> {
    let mut session = factory.open().await?;
    let outcome = drive_page(session.as_mut(), location, page, config, cancel).await;
    if let Err(e) = session.quit().await {
        warn!(error = %e, "session teardown failed");
    }
    outcome
}

/// The crawl flow proper, separated so [`run_page`] can release the session
/// no matter how it exits.
async fn drive_page(
    session: &mut dyn SessionDriver,
    location: &str,
    page: u32,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> Result<Vec<RestaurantRecord>> {
    // Every worker re-runs the search; the site keeps no cross-session
    // pagination state.
    session.open_search(location).await?;
    if page > 1 {
        session.goto_page(page).await?;
    }
    tokio::time::sleep(config.listing_settle).await;

    let html = session.page_html().await?;
    let listings = extract::parse_listings(&html);
    debug!(count = listings.len(), "listings parsed");

    let mut records = Vec::with_capacity(listings.len());
    for listing in listings {
        if cancel.is_cancelled() {
            return Err(ScoutError::Cancelled);
        }

        if let Err(e) = session.open_review_panel(listing.index).await {
            warn!(
                index = listing.index,
                name = %listing.name,
                error = %e,
                "review panel failed to open, skipping listing"
            );
            continue;
        }
        let reviews = collect_reviews(session, config).await;

        records.push(RestaurantRecord::new(
            listing.name,
            listing.score,
            listing.address,
            reviews,
        ));
    }

    Ok(records)
}

/// Expand and harvest the reviews in the open panel, restoring the listing
/// context before returning. Never fails: the worst case is the placeholder.
async fn collect_reviews(
    session: &mut dyn SessionDriver,
    config: &CrawlConfig,
) -> Vec<ReviewEntry> {
    for _ in 0..config.expand_cap {
        match session.expand_reviews().await {
            Ok(true) => tokio::time::sleep(config.expand_delay).await,
            Ok(false) => break,
            Err(e) => {
                debug!(error = %e, "review expansion stopped early");
                break;
            }
        }
    }

    let mut reviews = match session.page_html().await {
        Ok(html) => extract::parse_reviews(&html),
        Err(e) => {
            warn!(error = %e, "review panel read failed");
            Vec::new()
        }
    };
    if reviews.is_empty() {
        reviews.push(ReviewEntry::placeholder());
    }

    if let Err(e) = session.close_review_panel().await {
        warn!(error = %e, "failed to restore listing context");
    }

    reviews
}
