//! Embedding provider trait and factory.

use super::providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
use folio_core::config::EmbeddingSettings;
use folio_core::{AppError, AppResult, EmbeddingError};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Implementations only talk to their backend. Batching, timeouts, retries
/// and dimension checks are applied by [`super::EmbeddingEngine`].
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one vector per text, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        if results.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: results.len(),
            });
        }
        results.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

/// Create an embedding provider based on configuration.
///
/// # Arguments
/// * `settings` - Provider, model and endpoint
/// * `dimension` - Configured vector length
/// * `api_key` - API key for hosted providers
pub fn create_provider(
    settings: &EmbeddingSettings,
    dimension: usize,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(dimension))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            settings.endpoint.as_deref(),
            &settings.model,
            dimension,
        )?)),

        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(
                    "OpenAI embedding provider requires an API key (embedding.apiKeyEnv or OPENAI_API_KEY)"
                        .to_string(),
                )
            })?;
            Ok(Arc::new(OpenAiProvider::new(
                settings.endpoint.as_deref(),
                &settings.model,
                dimension,
                api_key,
            )?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, openai",
            settings.provider
        ))),
    }
}
