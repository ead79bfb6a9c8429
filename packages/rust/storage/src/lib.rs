//! libSQL document store for cached review crawls.
//!
//! [`DocumentStore`] persists one [`StoredDocument`] per [`QueryKey`]:
//! `index_name` is the key's region, `doc_id` its normalized query, and the
//! record payload is serialized JSON. A missing document is `Ok(None)`,
//! never an error; the acquisition pipeline treats it as a cache miss.

mod migrations;

use std::path::Path;

use libsql::{Connection, Database, params};
use reviewscout_shared::{QueryKey, Result, ScoutError, StoredDocument};

/// Storage handle wrapping a libSQL database.
pub struct DocumentStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl DocumentStore {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ScoutError::Storage(e.to_string()))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ScoutError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Document operations
    // -----------------------------------------------------------------------

    /// Get the document stored for `key`, or `None` when the query has never
    /// been crawled.
    pub async fn get(&self, key: &QueryKey) -> Result<Option<StoredDocument>> {
        let mut rows = self
            .conn
            .query(
                "SELECT query, restaurants_json, stored_at FROM documents
                 WHERE index_name = ?1 AND doc_id = ?2",
                params![key.region.as_str(), key.normalized.as_str()],
            )
            .await
            .map_err(|e| ScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_document(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ScoutError::Storage(e.to_string())),
        }
    }

    /// Insert or replace the document stored for `key`.
    pub async fn upsert(&self, key: &QueryKey, doc: &StoredDocument) -> Result<()> {
        let restaurants_json = serde_json::to_string(&doc.restaurants)
            .map_err(|e| ScoutError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO documents (index_name, doc_id, query, restaurants_json, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(index_name, doc_id) DO UPDATE SET
                   query = excluded.query,
                   restaurants_json = excluded.restaurants_json,
                   stored_at = excluded.stored_at",
                params![
                    key.region.as_str(),
                    key.normalized.as_str(),
                    doc.query.as_str(),
                    restaurants_json.as_str(),
                    doc.stored_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| ScoutError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Convert a database row to a [`StoredDocument`].
fn row_to_document(row: &libsql::Row) -> Result<StoredDocument> {
    let query: String = row
        .get(0)
        .map_err(|e| ScoutError::Storage(e.to_string()))?;
    let restaurants_json: String = row
        .get(1)
        .map_err(|e| ScoutError::Storage(e.to_string()))?;
    let stored_at_raw: String = row
        .get(2)
        .map_err(|e| ScoutError::Storage(e.to_string()))?;

    Ok(StoredDocument {
        query,
        restaurants: serde_json::from_str(&restaurants_json)
            .map_err(|e| ScoutError::Storage(format!("corrupt restaurants_json: {e}")))?,
        stored_at: chrono::DateTime::parse_from_rfc3339(&stored_at_raw)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| ScoutError::Storage(format!("invalid date: {e}")))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewscout_shared::RestaurantRecord;
    use uuid::Uuid;

    /// Create a temp file store for testing.
    async fn test_store() -> DocumentStore {
        let tmp = std::env::temp_dir().join(format!("rs_test_{}.db", Uuid::now_v7()));
        DocumentStore::open(&tmp).await.expect("open test db")
    }

    fn record(name: &str) -> RestaurantRecord {
        RestaurantRecord::new(name, "4.5", "서울 성동구 성수동", vec![])
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let store = test_store().await;
        assert_eq!(store.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("rs_test_{}.db", Uuid::now_v7()));
        let s1 = DocumentStore::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = DocumentStore::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn get_miss_returns_none() {
        let store = test_store().await;
        let key = QueryKey::parse("Seoul 강남 pasta").unwrap();
        let found = store.get(&key).await.expect("get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let store = test_store().await;
        let key = QueryKey::parse("Seoul 강남 pasta").unwrap();
        let doc = StoredDocument::new(&key, vec![record("파스타집")]);

        store.upsert(&key, &doc).await.expect("upsert");

        let found = store.get(&key).await.expect("get").expect("document");
        assert_eq!(found.query, "Seoul_강남_pasta");
        assert_eq!(found.restaurants.len(), 1);
        assert_eq!(found.restaurants[0].name, "파스타집");
        assert!(!found.restaurants[0].reviews.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_document() {
        let store = test_store().await;
        let key = QueryKey::parse("Seoul 강남 pasta").unwrap();

        let first = StoredDocument::new(&key, vec![record("a")]);
        store.upsert(&key, &first).await.expect("first upsert");

        let second = StoredDocument::new(&key, vec![record("a"), record("b")]);
        store.upsert(&key, &second).await.expect("second upsert");

        let found = store.get(&key).await.unwrap().unwrap();
        assert_eq!(found.restaurants.len(), 2);
        assert!(found.stored_at >= first.stored_at);
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let store = test_store().await;
        let gangnam = QueryKey::parse("Seoul 강남 pasta").unwrap();
        let mapo = QueryKey::parse("Seoul 마포 pasta").unwrap();
        let busan = QueryKey::parse("Busan 강남 pasta").unwrap();

        store
            .upsert(&gangnam, &StoredDocument::new(&gangnam, vec![record("x")]))
            .await
            .unwrap();

        assert!(store.get(&gangnam).await.unwrap().is_some());
        assert!(store.get(&mapo).await.unwrap().is_none());
        assert!(store.get(&busan).await.unwrap().is_none());
    }
}
