//! Threshold, sort and truncate scored candidates.

use std::cmp::Ordering;

use crate::models::{SimilarCaseResult, SimilarityConfig};

/// Rank scored candidates.
///
/// Drops results below `min_similarity`, sorts by similarity descending and
/// keeps the first `max_results`. The sort is stable, so ties keep their
/// input order.
pub fn rank(mut results: Vec<SimilarCaseResult>, config: &SimilarityConfig) -> Vec<SimilarCaseResult> {
    results.retain(|r| r.similarity >= config.min_similarity);
    results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
    results.truncate(config.max_results);
    results
}
