//! Ingest-and-answer scenarios over the full pipeline.

#[cfg(test)]
mod tests {
    use crate::chunker::window_count;
    use crate::highlight::Highlighter;
    use crate::rag::{answer, AskRequest, ExtractiveGenerator, LlmGenerator, Synthesizer};
    use crate::tests::{handbook_uploads, trigram_corpus};
    use async_trait::async_trait;
    use folio_core::{AppResult, RetrievalConfig};
    use folio_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn extractive() -> Synthesizer {
        Synthesizer::new(Arc::new(ExtractiveGenerator::new()), &RetrievalConfig::default())
    }

    #[tokio::test]
    async fn test_answer_is_attributed_to_source_and_page() {
        let corpus = trigram_corpus(RetrievalConfig::default());
        let report = corpus.ingest(handbook_uploads()).await.unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.pages, 5);
        assert_eq!(report.chunks, 5 * window_count(1500, 1000, 200));
        assert!(report.failures.is_empty());

        let response = answer(
            &corpus.retriever().unwrap(),
            &extractive(),
            &Highlighter::default(),
            &AskRequest::new("Lisbon warehouse"),
        )
        .await
        .unwrap();

        assert_eq!(response.sources.len(), 3);
        assert_eq!(response.snapshot_version, 1);

        for source in &response.sources[..2] {
            assert_eq!(source.source_name, "shipping.txt");
            assert_eq!(source.page_number, 2);
            assert!(source.snippet.contains("<mark>Lisbon warehouse</mark>"));
            assert!(!source.snippet.contains('\n'));
        }

        let ranks: Vec<usize> = response.sources.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(response
            .sources
            .windows(2)
            .all(|w| w[0].score >= w[1].score));

        assert!(response.answer.contains("Lisbon warehouse"));
        assert!(response.answer.ends_with("[shipping.txt, page 2]"));
    }

    #[tokio::test]
    async fn test_each_topic_resolves_to_its_page() {
        let corpus = trigram_corpus(RetrievalConfig::default());
        corpus.ingest(handbook_uploads()).await.unwrap();
        let retriever = corpus.retriever().unwrap();

        let cases = [
            ("refunds returned item", "handbook.txt", 1),
            ("warranty receipt serial number", "handbook.txt", 2),
            ("gift cards store credit", "handbook.txt", 3),
            ("customer support phone weekdays", "shipping.txt", 1),
        ];

        for (query, source, page) in cases {
            let results = retriever
                .retrieve(query, &Default::default())
                .await
                .unwrap();
            assert_eq!(results[0].chunk.source_name, source, "{}", query);
            assert_eq!(results[0].chunk.page_number, page, "{}", query);
        }
    }

    #[tokio::test]
    async fn test_document_filter_limits_sources() {
        let corpus = trigram_corpus(RetrievalConfig::default());
        corpus.ingest(handbook_uploads()).await.unwrap();

        let handbook_id = corpus.document_stats()[0].id.clone();
        let request = AskRequest::new("Lisbon warehouse")
            .with_top_k(10)
            .with_documents(vec![handbook_id]);

        let response = answer(
            &corpus.retriever().unwrap(),
            &extractive(),
            &Highlighter::default(),
            &request,
        )
        .await
        .unwrap();

        assert_eq!(response.sources.len(), 6);
        assert!(response
            .sources
            .iter()
            .all(|s| s.source_name == "handbook.txt"));
    }

    /// Counts calls; never expected to be reached.
    struct Counting(AtomicU32);

    #[async_trait]
    impl crate::rag::GenerationProvider for Counting {
        fn provider_name(&self) -> &str {
            "counting"
        }

        async fn generate(
            &self,
            _query: &str,
            _context: &[crate::types::RetrievedChunk],
        ) -> AppResult<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("unexpected".to_string())
        }
    }

    #[tokio::test]
    async fn test_no_passages_skips_generation() {
        let corpus = trigram_corpus(RetrievalConfig::default());
        corpus.ingest(handbook_uploads()).await.unwrap();

        let provider = Arc::new(Counting(AtomicU32::new(0)));
        let synthesizer = Synthesizer::new(provider.clone(), &RetrievalConfig::default());
        let request = AskRequest::new("refunds").with_documents(vec!["doc-9-unknown".to_string()]);

        let response = answer(
            &corpus.retriever().unwrap(),
            &synthesizer,
            &Highlighter::default(),
            &request,
        )
        .await
        .unwrap();

        assert!(response.sources.is_empty());
        assert!(response.answer.contains("could not find"));
        assert_eq!(provider.0.load(Ordering::SeqCst), 0);
    }

    /// LLM double that answers with a fixed string and keeps the prompts it saw.
    #[derive(Default)]
    struct ScriptedLlm {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(LlmResponse {
                content: "Refunds are issued within fourteen days [1].".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(400, 12),
            })
        }
    }

    #[tokio::test]
    async fn test_llm_generator_receives_ranked_passages() {
        let corpus = trigram_corpus(RetrievalConfig::default());
        corpus.ingest(handbook_uploads()).await.unwrap();

        let llm = Arc::new(ScriptedLlm::default());
        let synthesizer = Synthesizer::new(
            Arc::new(LlmGenerator::new(llm.clone(), "llama3.2")),
            &RetrievalConfig::default(),
        );

        let response = answer(
            &corpus.retriever().unwrap(),
            &synthesizer,
            &Highlighter::default(),
            &AskRequest::new("How fast are refunds issued?"),
        )
        .await
        .unwrap();

        assert_eq!(response.answer, "Refunds are issued within fourteen days [1].");
        assert_eq!(response.sources[0].source_name, "handbook.txt");
        assert_eq!(response.sources[0].page_number, 1);

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[1] handbook.txt, page 1"));
        assert!(prompts[0].contains("[3] "));
        assert!(prompts[0].contains("How fast are refunds issued?"));
    }

    #[tokio::test]
    async fn test_identical_corpora_answer_identically() {
        let first = trigram_corpus(RetrievalConfig::default());
        let second = trigram_corpus(RetrievalConfig::default());
        first.ingest(handbook_uploads()).await.unwrap();
        second.ingest(handbook_uploads()).await.unwrap();

        let request = AskRequest::new("warranty receipt");
        let a = answer(
            &first.retriever().unwrap(),
            &extractive(),
            &Highlighter::default(),
            &request,
        )
        .await
        .unwrap();
        let b = answer(
            &second.retriever().unwrap(),
            &extractive(),
            &Highlighter::default(),
            &request,
        )
        .await
        .unwrap();

        assert_eq!(a, b);
    }
}
