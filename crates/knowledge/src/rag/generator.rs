//! Answer generation providers.

use crate::types::RetrievedChunk;
use async_trait::async_trait;
use folio_core::{AppError, AppResult};
use folio_llm::{LlmClient, LlmRequest};
use folio_prompt::{build_prompt, default_answer_prompt, PromptDefinition, PromptPassage};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Produces an answer to `query` from retrieved passages.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name for logs and errors (e.g., "ollama", "extractive")
    fn provider_name(&self) -> &str;

    /// Generate an answer grounded in `context`, which is ordered best first.
    async fn generate(&self, query: &str, context: &[RetrievedChunk]) -> AppResult<String>;
}

/// Renders the answer prompt and sends it to an LLM.
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    max_tokens: Option<u32>,
}

impl LlmGenerator {
    /// Use the built-in answer prompt.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            prompt: default_answer_prompt(),
            max_tokens: None,
        }
    }

    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn request(&self, query: &str, context: &[RetrievedChunk]) -> AppResult<LlmRequest> {
        let passages: Vec<PromptPassage> = context
            .iter()
            .map(|r| PromptPassage {
                index: r.rank + 1,
                source_name: r.chunk.source_name.clone(),
                page_number: r.chunk.page_number,
                text: r.chunk.text.clone(),
            })
            .collect();

        let built = build_prompt(&self.prompt, query, &passages)?;

        // Answers should be reproducible for the same passages
        let mut request = LlmRequest::new(built.user, &self.model).with_temperature(0.0);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        Ok(request)
    }
}

#[async_trait]
impl GenerationProvider for LlmGenerator {
    fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    async fn generate(&self, query: &str, context: &[RetrievedChunk]) -> AppResult<String> {
        let request = self.request(query, context)?;

        tracing::debug!(
            "Generating answer with {} (model: {}, passages: {})",
            self.client.provider_name(),
            self.model,
            context.len()
        );

        let response = self.client.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }
}

/// Answers with the leading sentence of the best passage.
///
/// Deterministic and offline; used by `--offline` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GenerationProvider for ExtractiveGenerator {
    fn provider_name(&self) -> &str {
        "extractive"
    }

    async fn generate(&self, _query: &str, context: &[RetrievedChunk]) -> AppResult<String> {
        let best = context
            .first()
            .ok_or_else(|| AppError::Other("No passages to answer from".to_string()))?;

        let sentence = best
            .chunk
            .text
            .unicode_sentences()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("");

        Ok(format!(
            "{} [{}, page {}]",
            sentence, best.chunk.source_name, best.chunk.page_number
        ))
    }
}
