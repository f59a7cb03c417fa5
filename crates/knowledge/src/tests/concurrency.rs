//! Corpus lifecycle under concurrent ingestion and queries.

#[cfg(test)]
mod tests {
    use crate::corpus::{Corpus, CorpusPhase};
    use crate::embeddings::providers::TrigramProvider;
    use crate::embeddings::EmbeddingProvider;
    use crate::pages::PlainTextPageSource;
    use crate::retriever::RetrieveOptions;
    use crate::tests::{engine_with, handbook_uploads, trigram_corpus};
    use crate::types::Upload;
    use async_trait::async_trait;
    use folio_core::{AppError, EmbeddingError, IndexError, IngestionError, RetrievalConfig};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    const DIM: usize = 64;

    fn config() -> RetrievalConfig {
        RetrievalConfig {
            embedding_dimension: DIM,
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Trigram embeddings, but each batch waits for `release` while `gated`.
    #[derive(Debug)]
    struct GatedProvider {
        inner: TrigramProvider,
        gated: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl GatedProvider {
        fn new() -> Self {
            Self {
                inner: TrigramProvider::new(DIM),
                gated: AtomicBool::new(false),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for GatedProvider {
        fn provider_name(&self) -> &str {
            "gated"
        }

        fn model_name(&self) -> &str {
            "trigram-v1"
        }

        fn dimensions(&self) -> usize {
            DIM
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if self.gated.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.embed_batch(texts).await
        }
    }

    /// Trigram embeddings until `failing` is set.
    #[derive(Debug)]
    struct SwitchableProvider {
        inner: TrigramProvider,
        failing: AtomicBool,
    }

    #[async_trait]
    impl EmbeddingProvider for SwitchableProvider {
        fn provider_name(&self) -> &str {
            "switchable"
        }

        fn model_name(&self) -> &str {
            "trigram-v1"
        }

        fn dimensions(&self) -> usize {
            DIM
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(EmbeddingError::Provider {
                    provider: "switchable".to_string(),
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.embed_batch(texts).await
        }
    }

    fn gated_corpus(provider: Arc<GatedProvider>) -> Arc<Corpus> {
        let config = config();
        let engine = engine_with(provider, &config);
        Arc::new(Corpus::new(config, engine, Arc::new(PlainTextPageSource::new())).unwrap())
    }

    #[tokio::test]
    async fn test_first_ingestion_reports_not_ready() {
        let provider = Arc::new(GatedProvider::new());
        provider.gated.store(true, Ordering::SeqCst);
        let corpus = gated_corpus(provider.clone());

        assert_eq!(corpus.retriever().unwrap_err(), IndexError::Empty);

        let task = {
            let corpus = Arc::clone(&corpus);
            tokio::spawn(async move { corpus.ingest(handbook_uploads()).await })
        };
        provider.entered.notified().await;

        assert_eq!(corpus.phase(), CorpusPhase::Ingesting);
        assert_eq!(corpus.retriever().unwrap_err(), IndexError::NotReady);

        let err = corpus.ingest(handbook_uploads()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Ingestion(IngestionError::InProgress)
        ));

        provider.gated.store(false, Ordering::SeqCst);
        provider.release.notify_one();

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.snapshot_version, 1);
        assert_eq!(corpus.phase(), CorpusPhase::Indexed);
        assert!(corpus.retriever().is_ok());
    }

    #[tokio::test]
    async fn test_queries_read_previous_snapshot_during_reingestion() {
        let provider = Arc::new(GatedProvider::new());
        let corpus = gated_corpus(provider.clone());
        corpus
            .ingest(vec![Upload::new("old.txt", "Refund policy of last year.")])
            .await
            .unwrap();

        provider.gated.store(true, Ordering::SeqCst);
        let task = {
            let corpus = Arc::clone(&corpus);
            tokio::spawn(async move {
                corpus
                    .ingest(vec![Upload::new("new.txt", "Refund policy of this year.")])
                    .await
            })
        };
        provider.entered.notified().await;

        let during = corpus.retriever().unwrap();
        assert_eq!(corpus.phase(), CorpusPhase::Ingesting);
        assert_eq!(during.snapshot_version(), 1);

        provider.gated.store(false, Ordering::SeqCst);
        provider.release.notify_one();
        task.await.unwrap().unwrap();

        // The retriever taken earlier still reads the snapshot it was bound to
        assert_eq!(during.snapshot_version(), 1);
        assert_eq!(during.snapshot().chunks()[0].source_name, "old.txt");

        let after = corpus.retriever().unwrap();
        assert_eq!(after.snapshot_version(), 2);
        assert_eq!(after.snapshot().chunks()[0].source_name, "new.txt");
    }

    #[tokio::test]
    async fn test_cancelled_ingestion_restores_phase() {
        let provider = Arc::new(GatedProvider::new());
        provider.gated.store(true, Ordering::SeqCst);
        let corpus = gated_corpus(provider.clone());

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            corpus.ingest(handbook_uploads()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(corpus.phase(), CorpusPhase::Empty);
        assert_eq!(corpus.retriever().unwrap_err(), IndexError::Empty);

        provider.gated.store(false, Ordering::SeqCst);
        assert!(corpus.ingest(handbook_uploads()).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_snapshot() {
        let config = config();
        let provider = Arc::new(SwitchableProvider {
            inner: TrigramProvider::new(DIM),
            failing: AtomicBool::new(false),
        });
        let engine = engine_with(provider.clone(), &config);
        let corpus = Corpus::new(config, engine, Arc::new(PlainTextPageSource::new())).unwrap();

        corpus.ingest(handbook_uploads()).await.unwrap();
        let before = corpus.snapshot().unwrap();

        provider.failing.store(true, Ordering::SeqCst);
        let err = corpus
            .ingest(vec![Upload::new("replacement.txt", "Entirely new content.")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Embedding(EmbeddingError::Provider { .. })
        ));
        assert_eq!(corpus.phase(), CorpusPhase::Indexed);

        let after = corpus.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.version(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_queries_match_sequential_results() {
        let corpus = trigram_corpus(config());
        corpus.ingest(handbook_uploads()).await.unwrap();
        let retriever = corpus.retriever().unwrap();

        let queries: Vec<String> = [
            "refunds returned item",
            "warranty receipt",
            "gift cards",
            "customer support phone",
            "Lisbon warehouse",
        ]
        .iter()
        .map(|q| q.to_string())
        .collect();
        let options = RetrieveOptions::default();

        let mut expected = Vec::new();
        for query in &queries {
            expected.push(retriever.retrieve(query, &options).await.unwrap());
        }

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let retriever = retriever.clone();
            let queries = queries.clone();
            tasks.push(tokio::spawn(async move {
                let options = RetrieveOptions::default();
                let mut results = Vec::new();
                for query in &queries {
                    results.push(retriever.retrieve(query, &options).await.unwrap());
                }
                results
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), expected);
        }

        let batched = retriever.retrieve_many(&queries, &options).await;
        for (result, expected) in batched.into_iter().zip(&expected) {
            assert_eq!(&result.unwrap(), expected);
        }
    }
}
