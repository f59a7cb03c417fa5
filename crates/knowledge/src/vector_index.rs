//! Vector index abstraction and similarity metrics.
//!
//! Score semantics by metric:
//! - [`SimilarityMetric::Cosine`]: cosine similarity in `[-1, 1]`, higher is
//!   more similar. A zero vector scores `0` against everything.
//! - [`SimilarityMetric::Euclidean`]: L2 distance, lower is more similar.

use crate::types::SearchHit;
use folio_core::{IndexError, SimilarityMetric};
use std::cmp::Ordering;

/// Trait for vector index backends.
///
/// An index is built once from a complete set of vectors and is read-only
/// afterwards, so `search` takes `&self` and may run from many tasks at once.
/// The exact [`crate::flat_index::FlatIndex`] is the only backend today; an
/// approximate one can slot in behind the same trait.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Vector length every entry and query must have.
    fn dimension(&self) -> usize;

    fn metric(&self) -> SimilarityMetric;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the `min(k, len)` best entries for `query`, best first.
    ///
    /// Ties are broken by ascending insertion index.
    ///
    /// # Errors
    /// * `IndexError::InvalidArgument` if `k == 0`
    /// * `IndexError::DimensionMismatch` if `query.len() != dimension()`
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError>;
}

/// Ranking direction of a metric.
pub trait MetricExt {
    /// Whether larger scores mean more similar.
    fn higher_is_better(self) -> bool;

    /// Order two scores best first. NaN sorts after every number.
    fn compare_scores(self, a: f32, b: f32) -> Ordering;
}

impl MetricExt for SimilarityMetric {
    fn higher_is_better(self) -> bool {
        matches!(self, SimilarityMetric::Cosine)
    }

    fn compare_scores(self, a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = if self.higher_is_better() {
                    b.partial_cmp(&a)
                } else {
                    a.partial_cmp(&b)
                };
                ord.unwrap_or(Ordering::Equal)
            }
        }
    }
}

/// Validate the arguments shared by every `search` implementation.
pub(crate) fn check_search_args(
    dimension: usize,
    query: &[f32],
    k: usize,
) -> Result<(), IndexError> {
    if k == 0 {
        return Err(IndexError::InvalidArgument {
            argument: "k".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if query.len() != dimension {
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }

    Ok(())
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Cosine similarity from a dot product and both norms; `0` if either norm is `0`.
pub fn cosine_from_parts(dot: f32, norm_a: f32, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_from_parts(dot(a, b), l2_norm(a), l2_norm(b))
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
