//! Character trigram embeddings for offline use and tests.

use crate::embeddings::provider::EmbeddingProvider;
use folio_core::EmbeddingError;
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

/// Words too common to help discriminate passages.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "does", "do",
];

/// Deterministic, content-dependent embeddings built from hashed word
/// trigrams.
///
/// Texts sharing words land close together under cosine similarity. Not
/// semantic, but stable across runs and platforms, which makes it the
/// default offline provider and the test double of the pipeline.
#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Unit-length embedding of `text`; the zero vector when it has no content words.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();

        // Ordered map: summation order, and so the floats, never vary
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower.unicode_words() {
            if word.chars().count() > 2 && !STOP_WORDS.contains(&word) {
                *word_freq.entry(word).or_insert(0) += 1;
            }
        }

        for (word, freq) in &word_freq {
            let weight = (*freq as f32).sqrt();
            let padded: Vec<char> = format!(" {} ", word).chars().collect();

            for trigram in padded.windows(3) {
                let hash = fnv1a(trigram.iter().collect::<String>().as_bytes());
                embedding[(hash % self.dimensions as u64) as usize] += weight;
            }

            let word_dim = (fnv1a(word.as_bytes()).rotate_left(17) % self.dimensions as u64) as usize;
            embedding[word_dim] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325u64, |hash, b| {
        (hash ^ *b as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_batch() {
        let provider = TrigramProvider::new(384);
        let texts = vec![
            "hello world".to_string(),
            "test embedding".to_string(),
            "rust programming".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            assert!((norm(embedding) - 1.0).abs() < 0.001);
        }
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384);
        let text = "deterministic test with repeated repeated words";

        let embedding1 = provider.embed(text).await.unwrap();
        let embedding2 = TrigramProvider::new(384).embed(text).await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed_text("refund policy for damaged items");
        let related = provider.embed_text("Our refund policy covers damaged or defective items.");
        let unrelated = provider.embed_text("The cafeteria opens at seven on weekdays.");

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed_text("");

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_utf8_safety() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed_text("Gamedex é um aplicativo 🎮 brasileiro para gerenciar jogos!");

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
