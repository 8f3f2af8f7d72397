//! Context store trait.
//!
//! # Search semantics
//!
//! | Query | Result |
//! |-------|--------|
//! | empty | every record, store order |
//! | K >= 1 matches | exactly those K records, store order |
//! | zero matches | every record, store order |
//!
//! Matching is a case-insensitive substring test against
//! [`ContextRecord::formatted`], so a query can hit the kind tag too.
//!
//! # Implementor Notes
//!
//! - Methods use `&self` to enable sharing via `Arc<dyn ContextStore>`
//! - Use interior mutability for mutable state
//! - `list_all` must return records in insertion order
//! - Backends with a native query language may override `search`, but must
//!   keep the fallback law

use crate::Result;
use crate::models::ContextRecord;

/// Ordered, append-only store of context records.
pub trait ContextStore: Send + Sync {
    /// Backend name for logs and `GET /` diagnostics.
    fn name(&self) -> &'static str;

    /// Appends a record at the end of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn append(&self, record: ContextRecord) -> Result<()>;

    /// Returns every record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn list_all(&self) -> Result<Vec<ContextRecord>>;

    /// Removes every record and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn reset(&self) -> Result<usize>;

    /// Keyword search with fallback to the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn search(&self, query: &str) -> Result<SearchOutcome> {
        Ok(keyword_search(self.list_all()?, query))
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn count(&self) -> Result<usize> {
        Ok(self.list_all()?.len())
    }
}

/// Records returned by [`ContextStore::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Matching records, or the whole store on fallback.
    pub records: Vec<ContextRecord>,
    /// True when zero records matched and the whole store was returned.
    pub fallback: bool,
}

/// Applies the keyword search law to an ordered record list.
#[must_use]
pub fn keyword_search(all: Vec<ContextRecord>, query: &str) -> SearchOutcome {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchOutcome {
            records: all,
            fallback: false,
        };
    }

    let matches: Vec<ContextRecord> = all
        .iter()
        .filter(|record| record.formatted().to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if matches.is_empty() {
        SearchOutcome {
            records: all,
            fallback: true,
        }
    } else {
        SearchOutcome {
            records: matches,
            fallback: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordId, RecordKind};
    use test_case::test_case;

    fn records() -> Vec<ContextRecord> {
        vec![
            ContextRecord::new(RecordId::new("a"), RecordKind::Adr, "Title: Use Redis"),
            ContextRecord::new(
                RecordId::new("b"),
                RecordKind::DeadEnd,
                "Approach: Braintree gateway",
            ),
            ContextRecord::new(RecordId::new("c"), RecordKind::Adr, "Title: Stripe payments"),
        ]
    }

    #[test_case("", &["a", "b", "c"], false; "empty query returns everything")]
    #[test_case("   ", &["a", "b", "c"], false; "blank query returns everything")]
    #[test_case("braintree", &["b"], false; "case insensitive match")]
    #[test_case("  Braintree \t", &["b"], false; "surrounding whitespace is ignored")]
    #[test_case("title", &["a", "c"], false; "multiple matches keep order")]
    #[test_case("[adr]", &["a", "c"], false; "tag is searchable")]
    #[test_case("kafka", &["a", "b", "c"], true; "zero matches fall back")]
    fn test_keyword_search(query: &str, expected: &[&str], fallback: bool) {
        let outcome = keyword_search(records(), query);
        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert_eq!(outcome.fallback, fallback);
    }

    #[test]
    fn test_keyword_search_empty_store() {
        let outcome = keyword_search(Vec::new(), "anything");
        assert!(outcome.records.is_empty());
        assert!(outcome.fallback);
    }
}
