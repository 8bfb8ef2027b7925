//! Review filtering
//!
//! `filter_reviews` is the pure derivation. `FilteredView` memoizes it on an
//! explicit dependency key (snapshot version, query, category) so the output
//! keeps its identity until one of those three changes.

use super::loader::SnapshotCell;
use crate::model::{Review, Sentiment};
use std::sync::Arc;
use tracing::trace;

/// Sentiment category selector for the review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Sentiment),
}

impl CategoryFilter {
    /// Selector order as shown to the operator.
    pub const OPTIONS: [CategoryFilter; 4] = [
        CategoryFilter::All,
        CategoryFilter::Only(Sentiment::Positive),
        CategoryFilter::Only(Sentiment::Neutral),
        CategoryFilter::Only(Sentiment::Negative),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(s) => s.label(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(CategoryFilter::All);
        }
        Sentiment::parse(s).map(CategoryFilter::Only)
    }

    fn position(&self) -> usize {
        Self::OPTIONS.iter().position(|o| o == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::OPTIONS[(self.position() + 1) % Self::OPTIONS.len()]
    }

    pub fn prev(&self) -> Self {
        let len = Self::OPTIONS.len();
        Self::OPTIONS[(self.position() + len - 1) % len]
    }

    fn admits(&self, review: &Review) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(s) => review.sentiment == Some(*s),
        }
    }
}

/// Keep reviews whose text or product name contains `query`
/// (case-insensitive) AND whose sentiment matches `category`. An empty query
/// with `All` returns the input unchanged. Input order is preserved.
pub fn filter_reviews(reviews: &[Review], query: &str, category: CategoryFilter) -> Vec<Review> {
    let needle = query.to_lowercase();
    reviews
        .iter()
        .filter(|r| matches_query(r, &needle) && category.admits(r))
        .cloned()
        .collect()
}

fn matches_query(review: &Review, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    review.text.to_lowercase().contains(needle)
        || review
            .product_name()
            .is_some_and(|name| name.to_lowercase().contains(needle))
}

/// Everything the filtered view depends on. Nothing else triggers a recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterKey {
    snapshot_version: u64,
    query: String,
    category: CategoryFilter,
}

#[derive(Debug, Default)]
pub struct FilteredView {
    key: Option<FilterKey>,
    output: Arc<Vec<Review>>,
    recomputes: u64,
}

impl FilteredView {
    /// Recompute if the snapshot, query or category moved since last time;
    /// otherwise hand back the same shared output.
    pub fn refresh(
        &mut self,
        cell: &SnapshotCell,
        query: &str,
        category: CategoryFilter,
    ) -> &Arc<Vec<Review>> {
        let stale = match &self.key {
            Some(key) => {
                key.snapshot_version != cell.version()
                    || key.query != query
                    || key.category != category
            }
            None => true,
        };

        if stale {
            let reviews = cell.get().map(|s| s.reviews.as_slice()).unwrap_or(&[]);
            self.output = Arc::new(filter_reviews(reviews, query, category));
            self.key = Some(FilterKey {
                snapshot_version: cell.version(),
                query: query.to_string(),
                category,
            });
            self.recomputes += 1;
            trace!(
                "filtered view recomputed: {} of {} reviews",
                self.output.len(),
                reviews.len()
            );
        }

        &self.output
    }

    pub fn current(&self) -> &Arc<Vec<Review>> {
        &self.output
    }

    #[cfg(test)]
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}
