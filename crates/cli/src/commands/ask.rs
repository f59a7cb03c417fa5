//! Ask command handler.
//!
//! Ingests the given documents and answers questions from them with
//! attributed, highlighted sources.

use crate::commands::documents::{load_corpus, DocumentArgs};
use clap::Args;
use folio_core::{config::AppConfig, AppError, AppResult};
use folio_knowledge::{
    answer, AnswerResponse, AskRequest, ExtractiveGenerator, GenerationProvider, Highlighter,
    LlmGenerator, SnippetOptions, Synthesizer,
};
use folio_llm::create_client;
use folio_prompt::{load_prompt, DEFAULT_PROMPT_ID};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Answer questions about documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Questions to ask; read one per line from stdin when omitted
    pub questions: Vec<String>,

    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Number of passages to retrieve per question
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Restrict retrieval to a document id (repeatable)
    #[arg(long = "document")]
    pub document_ids: Vec<String>,

    /// Prompt definition used for generation
    #[arg(long, default_value = DEFAULT_PROMPT_ID)]
    pub prompt: String,

    /// Answer with the best passage instead of calling an LLM
    #[arg(long)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let synthesizer = self.synthesizer(config)?;
        let (corpus, report) = load_corpus(config, &self.documents).await?;
        let retriever = corpus.retriever()?;
        let highlighter = Highlighter::default();

        tracing::debug!(
            "Snapshot v{} ready: {} chunk(s) from {} document(s)",
            report.snapshot_version,
            report.chunks,
            report.documents
        );

        if self.questions.is_empty() {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                let response =
                    answer(&retriever, &synthesizer, &highlighter, &self.request(config, question))
                        .await?;
                self.print(question, &response)?;
            }
        } else {
            for question in &self.questions {
                let response =
                    answer(&retriever, &synthesizer, &highlighter, &self.request(config, question))
                        .await?;
                self.print(question, &response)?;
            }
        }

        Ok(())
    }

    fn request(&self, config: &AppConfig, question: &str) -> AskRequest {
        let mut request = AskRequest::new(question)
            .with_snippet(SnippetOptions::from_config(&config.retrieval));
        if let Some(top_k) = self.top_k {
            request = request.with_top_k(top_k);
        }
        if !self.document_ids.is_empty() {
            request = request.with_documents(self.document_ids.clone());
        }
        request
    }

    /// Build the answer generator: extractive offline, otherwise the configured LLM.
    fn synthesizer(&self, config: &AppConfig) -> AppResult<Synthesizer> {
        let provider: Arc<dyn GenerationProvider> = if self.offline {
            Arc::new(ExtractiveGenerator::new())
        } else {
            config.validate()?;

            let endpoint = config
                .get_provider_config(&config.provider)
                .and_then(|pc| pc.endpoint());
            let api_key = config.resolve_api_key(&config.provider);
            let client = create_client(&config.provider, endpoint, api_key.as_deref())?;
            let prompt = load_prompt(&config.workspace, &self.prompt)?;

            tracing::debug!(
                "Generation provider: {} (model: {}, prompt: {})",
                config.provider,
                config.model,
                prompt.id
            );

            Arc::new(LlmGenerator::new(client, &config.model).with_prompt(prompt))
        };

        Ok(Synthesizer::new(provider, &config.retrieval))
    }

    fn print(&self, question: &str, response: &AnswerResponse) -> AppResult<()> {
        if self.json {
            let output = serde_json::json!({
                "question": question,
                "answer": response.answer,
                "sources": response.sources,
                "snapshotVersion": response.snapshot_version,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            if self.questions.len() != 1 {
                println!("Q: {}", question);
            }
            println!("{}", response.answer);
            println!();

            if response.sources.is_empty() {
                println!("Sources: (none)");
            } else {
                println!("Sources:");
                for source in &response.sources {
                    println!(
                        "  [{}] {}, page {} (score {:.3})",
                        source.rank + 1,
                        source.source_name,
                        source.page_number,
                        source.score
                    );
                    println!("      {}", source.snippet);
                }
            }
            println!();
        }

        Ok(())
    }
}
