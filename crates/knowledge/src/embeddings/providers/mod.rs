//! Embedding provider implementations.

pub mod ollama;
pub mod openai;
pub mod trigram;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use trigram::TrigramProvider;

use folio_core::{AppError, AppResult};
use std::time::Duration;

/// Transport-level ceiling; the engine applies the configured per-call timeout.
const REQUEST_TIMEOUT_SECS: u64 = 120;

fn http_client(provider: &str) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| {
            AppError::Config(format!(
                "Failed to create HTTP client for {}: {}",
                provider, e
            ))
        })
}
