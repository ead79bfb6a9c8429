//! Core domain types for the review-acquisition pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Review line stored when a listing yields no parseable reviews, so the
/// `reviews` sequence is never empty.
pub const REVIEW_PLACEHOLDER: &str = " ";

// ---------------------------------------------------------------------------
// QueryKey
// ---------------------------------------------------------------------------

/// Storage key derived from a combined "location keyword" query.
///
/// The first whitespace token groups documents ([`QueryKey::region`], the
/// store index); the whole query with whitespace collapsed to `_` is the
/// document id ([`QueryKey::normalized`]).
/// `"Seoul 강남 pasta"` keys as region `Seoul`, id `Seoul_강남_pasta`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    /// Grouping key: the first token of the query.
    pub region: String,
    /// Document id: all tokens joined with underscores.
    pub normalized: String,
}

impl QueryKey {
    /// Derive the key from a raw combined query.
    ///
    /// Whitespace runs collapse to a single separator so the same semantic
    /// query always maps to the same key. Blank input is rejected.
    pub fn parse(combined: &str) -> Result<Self> {
        let tokens: Vec<&str> = combined.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Err(ScoutError::validation(
                "query must contain at least one token",
            ));
        };
        Ok(Self {
            region: (*first).to_string(),
            normalized: tokens.join("_"),
        })
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.region, self.normalized)
    }
}

// ---------------------------------------------------------------------------
// ReviewEntry
// ---------------------------------------------------------------------------

/// One review, pre-formatted as the single line
/// `{level} | {review count} | {average} | {star width} | {comment}`.
///
/// The pipeline never decomposes this again; downstream consumers treat it
/// as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewEntry(String);

impl ReviewEntry {
    /// Assemble the stored line from the scraped sub-fields.
    pub fn from_parts(
        level: &str,
        review_count: &str,
        average: &str,
        star_width: &str,
        comment: &str,
    ) -> Self {
        Self(format!(
            "{level} | {review_count} | {average} | {star_width} | {comment}"
        ))
    }

    /// The blank entry substituted when zero reviews parse.
    pub fn placeholder() -> Self {
        Self(REVIEW_PLACEHOLDER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReviewEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RestaurantRecord
// ---------------------------------------------------------------------------

/// One restaurant listing with its collected reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    /// Listing name as displayed.
    pub name: String,
    /// Aggregate score, kept as scraped text.
    pub score: String,
    /// Street address line.
    pub address: String,
    /// Review lines; never empty (a placeholder stands in for none).
    pub reviews: Vec<ReviewEntry>,
}

impl RestaurantRecord {
    /// Build a record, substituting the placeholder when `reviews` is empty.
    pub fn new(
        name: impl Into<String>,
        score: impl Into<String>,
        address: impl Into<String>,
        mut reviews: Vec<ReviewEntry>,
    ) -> Self {
        if reviews.is_empty() {
            reviews.push(ReviewEntry::placeholder());
        }
        Self {
            name: name.into(),
            score: score.into(),
            address: address.into(),
            reviews,
        }
    }
}

// ---------------------------------------------------------------------------
// StoredDocument
// ---------------------------------------------------------------------------

/// The cached document persisted per [`QueryKey`].
///
/// Re-crawls of the same query append to `restaurants` (no deduplication)
/// and refresh `stored_at`; documents are never deleted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The normalized query this document answers.
    pub query: String,
    /// All records accumulated for the query across crawls.
    pub restaurants: Vec<RestaurantRecord>,
    /// When the document was last written.
    pub stored_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Create a fresh document stamped with the current time.
    pub fn new(key: &QueryKey, restaurants: Vec<RestaurantRecord>) -> Self {
        Self {
            query: key.normalized.clone(),
            restaurants,
            stored_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_key_splits_region_and_id() {
        let key = QueryKey::parse("Seoul 강남 pasta").expect("parse key");
        assert_eq!(key.region, "Seoul");
        assert_eq!(key.normalized, "Seoul_강남_pasta");
    }

    #[test]
    fn query_key_collapses_whitespace_runs() {
        let a = QueryKey::parse("성수동  burger").expect("parse");
        let b = QueryKey::parse(" 성수동 burger ").expect("parse");
        assert_eq!(a, b);
        assert_eq!(a.normalized, "성수동_burger");
    }

    #[test]
    fn query_key_rejects_blank_input() {
        assert!(QueryKey::parse("").is_err());
        assert!(QueryKey::parse("   ").is_err());
    }

    #[test]
    fn review_entry_formats_parts_in_order() {
        let entry = ReviewEntry::from_parts("레벨3", "12", "4.5", "90%", "맛있어요");
        assert_eq!(entry.as_str(), "레벨3 | 12 | 4.5 | 90% | 맛있어요");
    }

    #[test]
    fn record_substitutes_placeholder_for_no_reviews() {
        let record = RestaurantRecord::new("집밥", "4.2", "성수동 12-3", vec![]);
        assert_eq!(record.reviews.len(), 1);
        assert_eq!(record.reviews[0].as_str(), REVIEW_PLACEHOLDER);
        assert!(!record.reviews[0].as_str().is_empty());
    }

    #[test]
    fn record_keeps_parsed_reviews() {
        let reviews = vec![ReviewEntry::from_parts("a", "b", "c", "d", "e")];
        let record = RestaurantRecord::new("집밥", "4.2", "성수동 12-3", reviews);
        assert_eq!(record.reviews.len(), 1);
        assert_ne!(record.reviews[0].as_str(), REVIEW_PLACEHOLDER);
    }

    #[test]
    fn stored_document_roundtrip() {
        let key = QueryKey::parse("Seoul 강남 pasta").expect("parse key");
        let doc = StoredDocument::new(
            &key,
            vec![RestaurantRecord::new("집밥", "4.2", "성수동 12-3", vec![])],
        );

        let json = serde_json::to_string(&doc).expect("serialize");
        let parsed: StoredDocument = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.query, "Seoul_강남_pasta");
        assert_eq!(parsed.restaurants.len(), 1);
        assert_eq!(parsed.restaurants[0].reviews[0].as_str(), REVIEW_PLACEHOLDER);
    }
}
