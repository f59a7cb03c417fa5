//! Folio Core Library
//!
//! This crate provides the foundational utilities shared by every Folio crate:
//! - Error handling (`AppError`, `AppResult`) and the retrieval error taxonomy
//! - Logging infrastructure
//! - Configuration management (application and retrieval settings)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AppConfig, EmbeddingSettings, HighlightPolicy, LlmConfig, ProviderConfig, RetrievalConfig,
    SimilarityMetric,
};
pub use logging::LogFormat;
pub use error::{
    AppError, AppResult, EmbeddingError, HighlightError, IndexError, IngestionError,
    SynthesisError,
};
