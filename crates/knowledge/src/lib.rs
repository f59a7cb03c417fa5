//! Retrieval core for Folio.
//!
//! Uploaded documents are split into pages, chunked into overlapping
//! character windows, embedded and indexed as an immutable snapshot.
//! Questions are answered from the best-matching chunks with highlighted
//! source attributions.
//!
//! ```no_run
//! use folio_core::AppConfig;
//! use folio_knowledge::{
//!     answer, AskRequest, Corpus, EmbeddingEngine, ExtractiveGenerator, Highlighter,
//!     PlainTextPageSource, Synthesizer, Upload,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> folio_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let engine = EmbeddingEngine::from_config(&config)?;
//! let corpus = Corpus::new(config.retrieval.clone(), engine, Arc::new(PlainTextPageSource::new()))?;
//!
//! corpus.ingest(vec![Upload::new("handbook.txt", "Refunds take fourteen days.")]).await?;
//!
//! let synthesizer = Synthesizer::new(Arc::new(ExtractiveGenerator::new()), &config.retrieval);
//! let response = answer(
//!     &corpus.retriever()?,
//!     &synthesizer,
//!     &Highlighter::default(),
//!     &AskRequest::new("How long do refunds take?"),
//! )
//! .await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod corpus;
pub mod embeddings;
pub mod flat_index;
pub mod highlight;
pub mod pages;
pub mod rag;
pub mod retriever;
pub mod snapshot;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::Chunker;
pub use corpus::{Corpus, CorpusPhase};
pub use embeddings::{create_provider, EmbeddingEngine, EmbeddingProvider};
pub use flat_index::FlatIndex;
pub use highlight::Highlighter;
pub use pages::{PageSource, PlainTextPageSource};
pub use rag::{
    answer, AnswerResponse, AskRequest, ExtractiveGenerator, GenerationProvider, LlmGenerator,
    SnippetOptions, SourceRef, Synthesizer,
};
pub use retriever::{RetrieveOptions, Retriever};
pub use snapshot::IndexSnapshot;
pub use types::{
    Chunk, Document, DocumentFailure, DocumentSummary, IngestReport, Page, RetrievedChunk, Upload,
};
pub use vector_index::VectorIndex;
