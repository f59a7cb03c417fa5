//! Search command handler.
//!
//! Retrieval only: ranked passages with highlighted snippets and scores.

use crate::commands::documents::{load_corpus, DocumentArgs};
use clap::Args;
use folio_core::{config::AppConfig, AppError, AppResult};
use folio_knowledge::{Highlighter, RetrieveOptions};

/// Show the passages that best match a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Number of passages to return
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Restrict results to a document id (repeatable)
    #[arg(long = "document")]
    pub document_ids: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let (corpus, _) = load_corpus(config, &self.documents).await?;
        let retriever = corpus.retriever()?;

        let options = RetrieveOptions {
            top_k: self.top_k,
            document_ids: (!self.document_ids.is_empty()).then(|| self.document_ids.clone()),
        };
        let results = retriever.retrieve(&self.query, &options).await?;

        let highlighter = Highlighter::default();
        let retrieval = &config.retrieval;
        let mut rows = Vec::with_capacity(results.len());
        for result in &results {
            let snippet = highlighter.snippet(
                &result.chunk.text,
                &self.query,
                retrieval.snippet_length,
                retrieval.highlight_policy,
            )?;
            rows.push((result, snippet));
        }

        if self.json {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(result, snippet)| {
                    serde_json::json!({
                        "rank": result.rank,
                        "score": result.score,
                        "chunkId": result.chunk.id,
                        "documentId": result.chunk.document_id,
                        "sourceName": result.chunk.source_name,
                        "pageNumber": result.chunk.page_number,
                        "snippet": snippet,
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else if rows.is_empty() {
            println!("No matching passages");
        } else {
            println!(
                "{} result(s), metric {}:",
                rows.len(),
                retriever.snapshot().metric().as_str()
            );
            for (result, snippet) in &rows {
                println!(
                    "  [{}] {}, page {} (score {:.3}, {})",
                    result.rank + 1,
                    result.chunk.source_name,
                    result.chunk.page_number,
                    result.score,
                    result.chunk.id
                );
                println!("      {}", snippet);
            }
        }

        Ok(())
    }
}
