//! Embedding engine for the retrieval pipeline.
//!
//! Wraps one [`EmbeddingProvider`] with the policies the pipeline relies on:
//! batching, a per-call timeout, bounded retries with exponential backoff,
//! and validation of every returned vector against the configured
//! dimensionality.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use folio_core::{AppConfig, AppError, AppResult, EmbeddingError, RetrievalConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Characters of the offending input kept in a dimension mismatch error.
const INPUT_PREVIEW_CHARS: usize = 60;

/// Provider plus call policy. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EmbeddingEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    batch_size: usize,
    timeout: Duration,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl EmbeddingEngine {
    /// Wrap `provider` using the limits in `config`.
    ///
    /// Fails when the provider declares a dimensionality other than
    /// `config.embedding_dimension`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &RetrievalConfig) -> AppResult<Self> {
        if provider.dimensions() != config.embedding_dimension {
            return Err(AppError::Config(format!(
                "Embedding provider '{}' ({}) produces {} dimensions but embeddingDimension is {}",
                provider.provider_name(),
                provider.model_name(),
                provider.dimensions(),
                config.embedding_dimension
            )));
        }

        Ok(Self {
            inner: Arc::new(EngineInner {
                provider,
                dimension: config.embedding_dimension,
                batch_size: config.embedding.batch_size.max(1),
                timeout: Duration::from_secs(config.provider_timeout_secs),
                max_attempts: config.max_attempts.max(1),
                initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            }),
        })
    }

    /// Build the provider named in the configuration and wrap it.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let retrieval = &config.retrieval;
        let api_key = config.resolve_embedding_api_key();
        let provider = create_provider(
            &retrieval.embedding,
            retrieval.embedding_dimension,
            api_key.as_deref(),
        )?;

        tracing::debug!(
            "Embedding provider: {} (model: {}, dimensions: {})",
            provider.provider_name(),
            provider.model_name(),
            provider.dimensions()
        );

        Self::new(provider, retrieval)
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.inner.provider.model_name()
    }

    /// Embed `texts` in order, `batch_size` texts per provider call.
    #[instrument(skip(self, texts), fields(count = texts.len(), provider = %self.provider_name()))]
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.inner.batch_size) {
            let batch_vectors = self.embed_batch_with_retry(batch).await?;
            self.validate(batch, &batch_vectors)?;
            vectors.extend(batch_vectors);
        }

        debug!(
            "Generated {} embeddings of dimension {}",
            vectors.len(),
            self.inner.dimension
        );

        Ok(vectors)
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let texts = [query.to_string()];
        let mut vectors = self.embed_texts(&texts).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }

    async fn embed_batch_with_retry(
        &self,
        batch: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let inner = &self.inner;
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(inner.timeout, inner.provider.embed_batch(batch))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(EmbeddingError::Timeout {
                    provider: inner.provider.provider_name().to_string(),
                    after_ms: inner.timeout.as_millis() as u64,
                }),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < inner.max_attempts => {
                    let backoff = inner.initial_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        inner.max_attempts,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn validate(&self, batch: &[String], vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            });
        }

        for (text, vector) in batch.iter().zip(vectors) {
            if vector.len() != self.inner.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.inner.dimension,
                    actual: vector.len(),
                    input: preview(text),
                });
            }
        }

        Ok(())
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= INPUT_PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(INPUT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}
