use std::collections::BTreeSet;

use crate::query::{build_query_url, Category};
use crate::IdentifierSet;

/// One grid intersection: the search page it watches, the number of new
/// results found by the last refresh, and every result id ever seen there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    query_url: String,
    hits: Option<usize>,
    seen: IdentifierSet,
}

impl Cell {
    /// A never-refreshed cell for the given headings.
    pub fn fresh(terms: &str, region: &str, category: &Category) -> Self {
        Self::with_url(build_query_url(terms, region, category))
    }

    pub fn with_url(query_url: impl Into<String>) -> Self {
        Self {
            query_url: query_url.into(),
            hits: None,
            seen: IdentifierSet::new(),
        }
    }

    /// Reassembles a cell from persisted parts.
    pub fn from_parts(query_url: String, hits: Option<usize>, seen: IdentifierSet) -> Self {
        Self {
            query_url,
            hits,
            seen,
        }
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// `None` until the first successful refresh, and again after a failed one.
    pub fn hits(&self) -> Option<usize> {
        self.hits
    }

    pub fn seen(&self) -> &IdentifierSet {
        &self.seen
    }

    /// Applies one successful fetch: counts identifiers not seen before, then
    /// merges all of them into the seen set. Returns the new-item count.
    ///
    /// Counting must happen before the merge, otherwise every refresh would
    /// report zero.
    pub fn record_results<I, S>(&mut self, identifiers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fetched: BTreeSet<String> = identifiers
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        let new_count = fetched.iter().filter(|id| !self.seen.contains(id)).count();
        self.hits = Some(new_count);
        self.seen.extend(fetched);
        new_count
    }

    /// Marks the last refresh as failed. The seen set is left alone.
    pub fn mark_unknown(&mut self) {
        self.hits = None;
    }
}
