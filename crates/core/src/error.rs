//! Error types for Folio.
//!
//! `AppError` is the unified error enum returned by every crate. The retrieval
//! pipeline has its own structured families (ingestion, embedding, index,
//! synthesis, highlight) so callers can tell the kind of failure and the
//! offending input apart without parsing messages.

use thiserror::Error;

/// Unified error type for Folio.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM client errors (transport, protocol)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Highlight(#[from] HighlightError),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Stable short label for the error family, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Llm(_) => "llm",
            AppError::Prompt(_) => "prompt",
            AppError::Serialization(_) => "serialization",
            AppError::Ingestion(_) => "ingestion",
            AppError::Embedding(_) => "embedding",
            AppError::Index(_) => "index",
            AppError::Synthesis(_) => "synthesis",
            AppError::Highlight(_) => "highlight",
            AppError::Other(_) => "other",
        }
    }
}

/// Per-document ingestion failures and batch-level ingestion failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    /// The document bytes could not be read as pages (corrupt, binary, bad encoding).
    #[error("Unreadable document '{source_name}': {reason}")]
    Unreadable { source_name: String, reason: String },

    /// The document format has no page source.
    #[error("Unsupported format '{format}' for document '{source_name}'")]
    UnsupportedFormat { source_name: String, format: String },

    /// Temporary storage for the upload could not be prepared.
    #[error("Failed to stage document '{source_name}': {reason}")]
    Staging { source_name: String, reason: String },

    /// The batch produced no chunks at all.
    #[error("Nothing to index: {documents} document(s) submitted, {failures} failed")]
    NothingIndexed { documents: usize, failures: usize },

    /// Another ingestion batch is already running.
    #[error("An ingestion batch is already in progress")]
    InProgress,
}

impl IngestionError {
    /// Name of the document the failure is about, if it concerns one.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            IngestionError::Unreadable { source_name, .. }
            | IngestionError::UnsupportedFormat { source_name, .. }
            | IngestionError::Staging { source_name, .. } => Some(source_name),
            IngestionError::NothingIndexed { .. } | IngestionError::InProgress => None,
        }
    }
}

/// Embedding provider failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// Provider call failed (quota, network, malformed input). Retryable.
    #[error("Embedding provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// A returned vector does not have the configured dimensionality.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual} (input: \"{input}\")")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        input: String,
    },

    /// The provider returned a different number of vectors than inputs.
    #[error("Embedding count mismatch: expected {expected} vectors, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// The provider did not answer in time. Retryable.
    #[error("Embedding provider '{provider}' timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },
}

impl EmbeddingError {
    /// Whether a caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Provider { .. } | EmbeddingError::Timeout { .. }
        )
    }
}

/// Vector index failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// No index has been built yet.
    #[error("No documents have been indexed yet")]
    Empty,

    /// The first index is still being built.
    #[error("The index is still being built")]
    NotReady,

    /// Vector length differs from the index dimensionality.
    #[error("Vector dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid caller input such as `k = 0`.
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },
}

/// Answer generation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Generation provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Generation provider '{provider}' timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },
}

/// Highlighting failures. Queries are escaped into literal patterns, so
/// this is never produced for any user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    #[error("Invalid highlight pattern for query \"{query}\": {reason}")]
    InvalidPattern { query: String, reason: String },
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_converts_into_app_error() {
        fn search() -> AppResult<()> {
            let result: Result<(), IndexError> = Err(IndexError::DimensionMismatch {
                expected: 1536,
                actual: 768,
            });
            result?;
            Ok(())
        }

        let err = search().unwrap_err();
        assert_eq!(err.kind(), "index");
        assert!(matches!(
            err,
            AppError::Index(IndexError::DimensionMismatch {
                expected: 1536,
                actual: 768
            })
        ));
        assert!(err.to_string().contains("1536"));
    }

    #[test]
    fn test_retryable_embedding_errors() {
        let provider = EmbeddingError::Provider {
            provider: "ollama".to_string(),
            message: "connection refused".to_string(),
        };
        let timeout = EmbeddingError::Timeout {
            provider: "ollama".to_string(),
            after_ms: 30_000,
        };
        let mismatch = EmbeddingError::DimensionMismatch {
            expected: 384,
            actual: 768,
            input: "hello".to_string(),
        };

        assert!(provider.is_retryable());
        assert!(timeout.is_retryable());
        assert!(!mismatch.is_retryable());
    }

    #[test]
    fn test_ingestion_error_source_name() {
        let err = IngestionError::UnsupportedFormat {
            source_name: "manual.pdf".to_string(),
            format: "pdf".to_string(),
        };
        assert_eq!(err.source_name(), Some("manual.pdf"));
        assert_eq!(IngestionError::InProgress.source_name(), None);
    }

    #[test]
    fn test_serde_errors_map_to_serialization() {
        let err: AppError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(err.kind(), "serialization");
    }
}
