//! SQL migration definitions for the reviewscout database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: documents keyed by (index_name, doc_id)",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One document per query key. index_name groups queries by region
-- (the first query token); doc_id is the underscore-normalized query.
CREATE TABLE IF NOT EXISTS documents (
    index_name       TEXT NOT NULL,
    doc_id           TEXT NOT NULL,
    query            TEXT NOT NULL,
    restaurants_json TEXT NOT NULL,
    stored_at        TEXT NOT NULL,
    PRIMARY KEY (index_name, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_index ON documents(index_name);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
