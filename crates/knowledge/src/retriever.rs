//! Query-time retrieval against one published snapshot.

use crate::embeddings::EmbeddingEngine;
use crate::snapshot::IndexSnapshot;
use crate::types::RetrievedChunk;
use folio_core::{AppResult, IndexError};
use futures::future::join_all;
use std::sync::Arc;

/// Per-query retrieval options.
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    /// Number of chunks to return; the configured default when `None`
    pub top_k: Option<usize>,
    /// Restrict results to these document ids
    pub document_ids: Option<Vec<String>>,
}

impl RetrieveOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_documents(mut self, document_ids: Vec<String>) -> Self {
        self.document_ids = Some(document_ids);
        self
    }
}

/// Embeds queries and ranks the chunks of a fixed snapshot.
///
/// A retriever holds its snapshot by reference count, so it keeps working on
/// the same data even after the corpus publishes a newer one. Cloning is
/// cheap and clones can be used from many tasks at once.
#[derive(Debug, Clone)]
pub struct Retriever {
    snapshot: Arc<IndexSnapshot>,
    engine: EmbeddingEngine,
    default_top_k: usize,
}

impl Retriever {
    pub fn new(snapshot: Arc<IndexSnapshot>, engine: EmbeddingEngine, default_top_k: usize) -> Self {
        Self {
            snapshot,
            engine,
            default_top_k,
        }
    }

    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    pub fn snapshot_version(&self) -> u64 {
        self.snapshot.version()
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Return the best chunks for `query`, best first.
    ///
    /// # Errors
    /// * `IndexError::InvalidArgument` for a blank query or `top_k == 0`
    /// * `EmbeddingError` if the query cannot be embedded
    /// * `IndexError::DimensionMismatch` if the query vector has the wrong length
    pub async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> AppResult<Vec<RetrievedChunk>> {
        if query.trim().is_empty() {
            return Err(IndexError::InvalidArgument {
                argument: "query".to_string(),
                reason: "must not be blank".to_string(),
            }
            .into());
        }

        let k = options.top_k.unwrap_or(self.default_top_k);
        let query_vector = self.engine.embed_query(query).await?;
        let results =
            self.snapshot
                .search(&query_vector, k, options.document_ids.as_deref())?;

        tracing::debug!(
            "Retrieved {} chunk(s) from snapshot v{} (top score: {:.3})",
            results.len(),
            self.snapshot.version(),
            results.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(results)
    }

    /// Run several queries concurrently against the same snapshot.
    ///
    /// Results are returned in query order; each query fails independently.
    pub async fn retrieve_many(
        &self,
        queries: &[String],
        options: &RetrieveOptions,
    ) -> Vec<AppResult<Vec<RetrievedChunk>>> {
        join_all(queries.iter().map(|q| self.retrieve(q, options))).await
    }
}
