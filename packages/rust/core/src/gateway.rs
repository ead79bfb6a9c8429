//! Cache gateway between the acquisition pipeline and the document store.
//!
//! One stored document per query key, extended on every re-crawl. The store
//! answering "no document" is a cache miss, not an error.

use chrono::Utc;
use tracing::debug;

use reviewscout_shared::{QueryKey, RestaurantRecord, Result, StoredDocument};
use reviewscout_storage::DocumentStore;

/// Cached records for `key`, or `None` when the query has never been crawled.
pub async fn lookup(
    store: &DocumentStore,
    key: &QueryKey,
) -> Result<Option<Vec<RestaurantRecord>>> {
    Ok(store.get(key).await?.map(|doc| doc.restaurants))
}

/// Append `new_records` to the document stored for `key`, refreshing its
/// timestamp; the document is created on first write.
///
/// Read-modify-write with no version check: concurrent writers for the same
/// key race and the last write wins. No deduplication happens here; re-crawls
/// grow the document. Returns the record count now stored.
pub async fn merge_and_persist(
    store: &DocumentStore,
    key: &QueryKey,
    new_records: Vec<RestaurantRecord>,
) -> Result<usize> {
    let doc = match store.get(key).await? {
        Some(mut existing) => {
            existing.restaurants.extend(new_records);
            existing.stored_at = Utc::now();
            existing
        }
        None => StoredDocument::new(key, new_records),
    };

    store.upsert(key, &doc).await?;
    debug!(key = %key, total = doc.restaurants.len(), "document persisted");
    Ok(doc.restaurants.len())
}
