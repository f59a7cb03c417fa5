//! Immutable index snapshots.
//!
//! A snapshot pairs a vector index with the chunks its entries point to.
//! It is built once per ingestion batch and never changes afterwards;
//! publishing a new corpus means swapping in a new snapshot.

use crate::flat_index::FlatIndex;
use crate::types::{Chunk, DocumentSummary, EmbeddedChunk, RetrievedChunk};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use folio_core::{IndexError, SimilarityMetric};

/// One published, read-only version of the corpus index.
#[derive(Debug)]
pub struct IndexSnapshot {
    version: u64,
    built_at: DateTime<Utc>,
    documents: Vec<DocumentSummary>,
    /// Entry `i` of the index is `chunks[i]`
    chunks: Vec<Chunk>,
    index: Box<dyn VectorIndex>,
}

impl IndexSnapshot {
    /// Build a snapshot from embedded chunks in insertion order.
    pub fn build(
        version: u64,
        dimension: usize,
        metric: SimilarityMetric,
        embedded: Vec<EmbeddedChunk>,
        documents: Vec<DocumentSummary>,
    ) -> Result<Self, IndexError> {
        let index = FlatIndex::build(dimension, metric, embedded.iter().map(EmbeddedChunk::vector))?;
        let chunks = embedded
            .into_iter()
            .map(|entry| entry.into_parts().0)
            .collect();

        Ok(Self {
            version,
            built_at: Utc::now(),
            documents,
            chunks,
            index: Box::new(index),
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.index.metric()
    }

    /// Rank chunks against `query` and resolve the best `k`.
    ///
    /// With `document_ids`, only chunks of those documents are considered;
    /// the filter applies to the full ranking, before truncation to `k`.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        document_ids: Option<&[String]>,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        let hits = match document_ids {
            None => self.index.search(query, k)?,
            Some(ids) => {
                if k == 0 {
                    // Same validation as the unfiltered path
                    return self.index.search(query, 0).map(|_| Vec::new());
                }
                self.index
                    .search(query, self.len().max(1))?
                    .into_iter()
                    .filter(|hit| {
                        let document_id = &self.chunks[hit.entry].document_id;
                        ids.iter().any(|id| id == document_id)
                    })
                    .take(k)
                    .collect()
            }
        };

        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| RetrievedChunk {
                rank,
                score: hit.score,
                chunk: self.chunks[hit.entry].clone(),
            })
            .collect())
    }
}
