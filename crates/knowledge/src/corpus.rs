//! Corpus lifecycle: ingestion, snapshot publication and query access.
//!
//! The corpus moves through `Empty -> Ingesting -> Indexed`, and every new
//! batch goes `Indexed -> Ingesting -> Indexed`, replacing the previous
//! snapshot wholesale. New snapshots are built without holding the state
//! lock and published by swapping an `Arc`, so queries that already hold a
//! retriever keep reading the snapshot they started with.

use crate::chunker::Chunker;
use crate::embeddings::EmbeddingEngine;
use crate::pages::{extract_pages, PageSource};
use crate::retriever::Retriever;
use crate::snapshot::IndexSnapshot;
use crate::types::{
    Chunk, Document, DocumentFailure, DocumentSummary, EmbeddedChunk, IngestReport, Upload,
};
use folio_core::{AppResult, IndexError, IngestionError, RetrievalConfig};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Lifecycle phase of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusPhase {
    /// No snapshot has been published
    Empty,
    /// A batch is being ingested
    Ingesting,
    /// A snapshot is published and queryable
    Indexed,
}

#[derive(Debug)]
struct CorpusState {
    phase: CorpusPhase,
    snapshot: Option<Arc<IndexSnapshot>>,
    last_version: u64,
}

/// A set of documents made searchable as one index snapshot.
#[derive(Debug)]
pub struct Corpus {
    config: RetrievalConfig,
    chunker: Chunker,
    engine: EmbeddingEngine,
    page_source: Arc<dyn PageSource>,
    state: RwLock<CorpusState>,
}

impl Corpus {
    /// Create an empty corpus.
    ///
    /// # Errors
    /// Returns `AppError::Config` for invalid chunking settings or when the
    /// engine dimensionality differs from `config.embedding_dimension`.
    pub fn new(
        config: RetrievalConfig,
        engine: EmbeddingEngine,
        page_source: Arc<dyn PageSource>,
    ) -> AppResult<Self> {
        config.validate()?;
        let chunker = Chunker::from_config(&config)?;
        tracing::debug!(
            "Corpus chunking: {} chars per window, {} overlap",
            chunker.chunk_size(),
            chunker.chunk_overlap()
        );

        if engine.dimension() != config.embedding_dimension {
            return Err(folio_core::AppError::Config(format!(
                "Embedding engine produces {} dimensions but embeddingDimension is {}",
                engine.dimension(),
                config.embedding_dimension
            )));
        }

        Ok(Self {
            config,
            chunker,
            engine,
            page_source,
            state: RwLock::new(CorpusState {
                phase: CorpusPhase::Empty,
                snapshot: None,
                last_version: 0,
            }),
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn phase(&self) -> CorpusPhase {
        self.read_state().phase
    }

    /// The currently published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.read_state().snapshot.clone()
    }

    /// Per-document statistics of the published snapshot.
    pub fn document_stats(&self) -> Vec<DocumentSummary> {
        self.snapshot()
            .map(|s| s.documents().to_vec())
            .unwrap_or_default()
    }

    /// A retriever bound to the snapshot published right now.
    ///
    /// # Errors
    /// * `IndexError::NotReady` while the first batch is still ingesting
    /// * `IndexError::Empty` when nothing has been indexed
    pub fn retriever(&self) -> Result<Retriever, IndexError> {
        let state = self.read_state();
        match (&state.snapshot, state.phase) {
            (Some(snapshot), _) => Ok(Retriever::new(
                Arc::clone(snapshot),
                self.engine.clone(),
                self.config.top_k,
            )),
            (None, CorpusPhase::Ingesting) => Err(IndexError::NotReady),
            (None, _) => Err(IndexError::Empty),
        }
    }

    /// Ingest a batch of uploads and publish it as the new snapshot.
    ///
    /// Documents that cannot be read are reported in the returned
    /// [`IngestReport`] and do not stop the batch. If the batch fails as a
    /// whole, or this future is dropped before completing, the previous
    /// snapshot and phase stay in place.
    ///
    /// # Errors
    /// * `IngestionError::InProgress` if another batch is running
    /// * `IngestionError::NothingIndexed` if no document produced a chunk
    /// * `EmbeddingError` / `IndexError` from embedding or index build
    pub async fn ingest(&self, uploads: Vec<Upload>) -> AppResult<IngestReport> {
        let start = Instant::now();

        let (guard, version) = {
            let mut state = self.write_state();
            if state.phase == CorpusPhase::Ingesting {
                return Err(IngestionError::InProgress.into());
            }
            let guard = PhaseGuard {
                state: &self.state,
                restore: state.phase,
                armed: true,
            };
            state.phase = CorpusPhase::Ingesting;
            (guard, state.last_version + 1)
        };

        tracing::info!(
            "Ingesting {} document(s) into snapshot v{}",
            uploads.len(),
            version
        );

        let mut documents = Vec::with_capacity(uploads.len());
        let mut failures = Vec::new();

        for (i, upload) in uploads.iter().enumerate() {
            match extract_pages(self.page_source.as_ref(), upload) {
                Ok(pages) => documents.push(Document::new(i + 1, upload, pages)),
                Err(e) => {
                    let source_name = e
                        .source_name()
                        .unwrap_or(upload.source_name.as_str())
                        .to_string();
                    tracing::warn!("Skipping '{}': {}", source_name, e);
                    failures.push(DocumentFailure::new(source_name, e));
                }
            }
        }

        let mut summaries = Vec::with_capacity(documents.len());
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pages = 0;

        for document in &documents {
            let document_chunks = self.chunker.chunk_document(document);
            pages += document.pages.len();
            summaries.push(DocumentSummary {
                id: document.id.clone(),
                source_name: document.source_name.clone(),
                pages: document.pages.len(),
                chunks: document_chunks.len(),
            });
            chunks.extend(document_chunks);
        }

        if chunks.is_empty() {
            return Err(IngestionError::NothingIndexed {
                documents: uploads.len(),
                failures: failures.len(),
            }
            .into());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.engine.embed_texts(&texts).await?;

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector))
            .collect();
        let chunk_count = embedded.len();

        let snapshot = IndexSnapshot::build(
            version,
            self.config.embedding_dimension,
            self.config.similarity_metric,
            embedded,
            summaries,
        )?;

        tracing::info!(
            "Published snapshot v{} ({} entries, dimension {}, metric {})",
            version,
            snapshot.len(),
            snapshot.dimension(),
            snapshot.metric().as_str()
        );

        {
            let mut state = self.write_state();
            state.snapshot = Some(Arc::new(snapshot));
            state.phase = CorpusPhase::Indexed;
            state.last_version = version;
        }
        guard.disarm();

        let report = IngestReport {
            snapshot_version: version,
            documents: documents.len(),
            pages,
            chunks: chunk_count,
            failures,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Ingestion complete: {} document(s), {} page(s), {} chunk(s), {} failure(s) in {:.2}s",
            report.documents,
            report.pages,
            report.chunks,
            report.failures.len(),
            report.duration_secs
        );

        Ok(report)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CorpusState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CorpusState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restores the pre-ingestion phase unless the batch was published.
struct PhaseGuard<'a> {
    state: &'a RwLock<CorpusState>,
    restore: CorpusPhase,
    armed: bool,
}

impl PhaseGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.phase = self.restore;
            tracing::debug!("Ingestion abandoned, corpus back to {:?}", self.restore);
        }
    }
}
