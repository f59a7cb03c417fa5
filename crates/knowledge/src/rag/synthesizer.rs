//! Call policy around a generation provider.

use crate::rag::generator::GenerationProvider;
use crate::types::RetrievedChunk;
use folio_core::{AppError, RetrievalConfig, SynthesisError};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A generation provider with a per-call timeout and bounded retries.
#[derive(Clone)]
pub struct Synthesizer {
    provider: Arc<dyn GenerationProvider>,
    timeout: Duration,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("provider", &self.provider.provider_name())
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Synthesizer {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: &RetrievalConfig) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(config.provider_timeout_secs),
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Generate an answer, retrying transport failures and timeouts.
    pub async fn synthesize(
        &self,
        query: &str,
        context: &[RetrievedChunk],
    ) -> Result<String, SynthesisError> {
        let mut attempt = 1;

        loop {
            let result =
                match tokio::time::timeout(self.timeout, self.provider.generate(query, context))
                    .await
                {
                    Ok(Ok(answer)) => return Ok(answer),
                    Ok(Err(e)) => Err((is_transient(&e), self.provider_error(&e))),
                    Err(_) => Err((
                        true,
                        SynthesisError::Timeout {
                            provider: self.provider_name().to_string(),
                            after_ms: self.timeout.as_millis() as u64,
                        },
                    )),
                };

            match result {
                Err((true, e)) if attempt < self.max_attempts => {
                    let backoff = self.initial_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Answer generation failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_attempts,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err((_, e)) => return Err(e),
                Ok(answer) => return Ok(answer),
            }
        }
    }

    fn provider_error(&self, error: &AppError) -> SynthesisError {
        SynthesisError::Provider {
            provider: self.provider_name().to_string(),
            message: error.to_string(),
        }
    }
}

/// Transport and I/O failures may succeed on a second try; prompt or
/// configuration failures will not.
fn is_transient(error: &AppError) -> bool {
    matches!(error, AppError::Llm(_) | AppError::Io(_))
}
