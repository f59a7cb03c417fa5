//! Generation provider implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use folio_core::{AppError, AppResult};
use std::time::Duration;

/// Upper bound on a single generation request.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds_with_request_timeout() {
        assert!(http_client("ollama").is_ok());
    }
}
