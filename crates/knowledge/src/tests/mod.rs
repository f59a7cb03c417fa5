//! Pipeline-level tests: ingestion through answering.

mod concurrency;
mod pipeline;

use crate::corpus::Corpus;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::{EmbeddingEngine, EmbeddingProvider};
use crate::pages::PlainTextPageSource;
use crate::types::Upload;
use folio_core::RetrievalConfig;
use std::sync::Arc;

/// Repeat `sentence` until the page is exactly `chars` characters long.
pub(crate) fn page(sentence: &str, chars: usize) -> String {
    let mut text = String::with_capacity(chars + sentence.len());
    while text.chars().count() < chars {
        text.push_str(sentence);
        text.push(' ');
    }
    text.chars().take(chars).collect()
}

/// Two documents: a three-page handbook and a two-page shipping guide,
/// each page 1500 characters about one topic.
pub(crate) fn handbook_uploads() -> Vec<Upload> {
    let handbook = [
        page("Refunds are issued within fourteen days of receiving the returned item.", 1500),
        page("Warranty claims require the original receipt and the product serial number.", 1500),
        page("Gift cards never expire and can be combined with store credit.", 1500),
    ]
    .join("\u{000C}");

    let shipping = [
        page("Customer support answers the phone from nine to five on weekdays.", 1500),
        page("Orders ship from the Lisbon warehouse within two business days.", 1500),
    ]
    .join("\u{000C}");

    vec![
        Upload::new("handbook.txt", handbook),
        Upload::new("shipping.txt", shipping),
    ]
}

pub(crate) fn engine_with(
    provider: Arc<dyn EmbeddingProvider>,
    config: &RetrievalConfig,
) -> EmbeddingEngine {
    EmbeddingEngine::new(provider, config).unwrap()
}

/// Corpus with default chunking and the trigram provider.
pub(crate) fn trigram_corpus(config: RetrievalConfig) -> Corpus {
    let provider = Arc::new(TrigramProvider::new(config.embedding_dimension));
    let engine = engine_with(provider, &config);
    Corpus::new(config, engine, Arc::new(PlainTextPageSource::new())).unwrap()
}
