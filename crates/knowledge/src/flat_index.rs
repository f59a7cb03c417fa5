//! Exact brute-force vector index.

use crate::types::SearchHit;
use crate::vector_index::{
    check_search_args, cosine_from_parts, dot, euclidean_distance, l2_norm, MetricExt,
    VectorIndex,
};
use folio_core::{IndexError, SimilarityMetric};

/// Vectors stored contiguously and compared one by one against each query.
///
/// Build is O(n), storage O(n·D) plus one precomputed norm per vector.
/// Suitable for hundreds to a few thousand chunks.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: SimilarityMetric,
    /// Row-major `len × dimension` matrix
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from vectors in insertion order.
    ///
    /// # Errors
    /// * `IndexError::InvalidArgument` if `dimension == 0`
    /// * `IndexError::DimensionMismatch` if any vector has another length
    pub fn build<'a, I>(
        dimension: usize,
        metric: SimilarityMetric,
        vectors: I,
    ) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        if dimension == 0 {
            return Err(IndexError::InvalidArgument {
                argument: "dimension".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let vectors = vectors.into_iter();
        let (lower, _) = vectors.size_hint();
        let mut data = Vec::with_capacity(lower * dimension);
        let mut norms = Vec::with_capacity(lower);

        for vector in vectors {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
            norms.push(l2_norm(vector));
        }

        Ok(Self {
            dimension,
            metric,
            data,
            norms,
        })
    }

    fn row(&self, entry: usize) -> &[f32] {
        &self.data[entry * self.dimension..(entry + 1) * self.dimension]
    }

    fn score(&self, entry: usize, query: &[f32], query_norm: f32) -> f32 {
        let row = self.row(entry);
        match self.metric {
            SimilarityMetric::Cosine => {
                cosine_from_parts(dot(row, query), self.norms[entry], query_norm)
            }
            SimilarityMetric::Euclidean => euclidean_distance(row, query),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    fn len(&self) -> usize {
        self.norms.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        check_search_args(self.dimension, query, k)?;

        let query_norm = l2_norm(query);
        let mut hits: Vec<SearchHit> = (0..self.len())
            .map(|entry| SearchHit {
                entry,
                score: self.score(entry, query, query_norm),
            })
            .collect();

        hits.sort_by(|a, b| {
            self.metric
                .compare_scores(a.score, b.score)
                .then(a.entry.cmp(&b.entry))
        });
        hits.truncate(k);

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(metric: SimilarityMetric, vectors: &[Vec<f32>]) -> FlatIndex {
        let dimension = vectors.first().map(Vec::len).unwrap_or(3);
        FlatIndex::build(dimension, metric, vectors.iter().map(Vec::as_slice)).unwrap()
    }

    fn sample() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.7, 0.7, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![-1.0, 0.0, 0.0],
        ]
    }

    fn entries(hits: &[SearchHit]) -> Vec<usize> {
        hits.iter().map(|h| h.entry).collect()
    }

    #[test]
    fn test_cosine_ranking_is_descending() {
        let index = build(SimilarityMetric::Cosine, &sample());
        let hits = index.search(&[0.9, 0.1, 0.0], 5).unwrap();

        assert_eq!(hits[0].entry, 0);
        assert_eq!(hits[1].entry, 1);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(hits.last().unwrap().entry, 4);
    }

    #[test]
    fn test_euclidean_ranking_is_ascending() {
        let index = build(SimilarityMetric::Euclidean, &sample());
        let hits = index.search(&[0.0, 0.9, 0.1], 5).unwrap();

        assert_eq!(hits[0].entry, 2);
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_result_count_is_min_of_k_and_len() {
        let index = build(SimilarityMetric::Cosine, &sample());
        let query = [0.1, 0.2, 0.3];

        assert_eq!(index.search(&query, 1).unwrap().len(), 1);
        assert_eq!(index.search(&query, 5).unwrap().len(), 5);
        assert_eq!(index.search(&query, 50).unwrap().len(), 5);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let vectors = vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ];

        for metric in [SimilarityMetric::Cosine, SimilarityMetric::Euclidean] {
            let index = build(metric, &vectors);
            let hits = index.search(&[1.0, 0.0], 5).unwrap();
            assert_eq!(&entries(&hits)[..2], &[1, 3], "{:?}", metric);
        }

        let cosine = build(SimilarityMetric::Cosine, &vectors);
        let hits = cosine.search(&[0.0, 1.0], 3).unwrap();
        assert_eq!(entries(&hits), vec![0, 2, 4]);
    }

    #[test]
    fn test_identical_searches_are_identical() {
        let index = build(SimilarityMetric::Cosine, &sample());
        let query = [0.3, 0.3, 0.3];

        let first = index.search(&query, 4).unwrap();
        let second = index.search(&query, 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_self_retrieval() {
        let vectors = sample();
        for metric in [SimilarityMetric::Cosine, SimilarityMetric::Euclidean] {
            let index = build(metric, &vectors);
            for (i, vector) in vectors.iter().enumerate() {
                let hits = index.search(vector, 1).unwrap();
                assert_eq!(hits[0].entry, i, "{:?}", metric);
            }
        }
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let index = build(SimilarityMetric::Cosine, &sample());
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 0),
            Err(IndexError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let vectors = vec![vec![0.5f32; 1536], vec![0.25f32; 1536]];
        let index = build(SimilarityMetric::Cosine, &vectors);

        let err = index.search(&vec![0.5f32; 768], 3).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 1536,
                actual: 768
            }
        );
    }

    #[test]
    fn test_build_rejects_mixed_dimensions() {
        let vectors = [vec![1.0f32, 0.0], vec![1.0f32, 0.0, 0.0]];
        let err = FlatIndex::build(2, SimilarityMetric::Cosine, vectors.iter().map(Vec::as_slice))
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_zero_vectors_score_zero_under_cosine() {
        let index = build(SimilarityMetric::Cosine, &[vec![0.0, 0.0], vec![1.0, 1.0]]);
        let hits = index.search(&[1.0, 1.0], 2).unwrap();

        assert_eq!(hits[0].entry, 1);
        assert_eq!(hits[1].score, 0.0);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = FlatIndex::build(3, SimilarityMetric::Cosine, std::iter::empty()).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0], 3).unwrap().is_empty());
    }
}
