//! Chunks command handler.
//!
//! Reports how documents were ingested: pages, chunks and skipped files.

use crate::commands::documents::{load_corpus, DocumentArgs};
use clap::Args;
use folio_core::{config::AppConfig, AppError, AppResult};

/// Show ingestion statistics for documents
#[derive(Args, Debug)]
pub struct ChunksCommand {
    #[command(flatten)]
    pub documents: DocumentArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunksCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chunks command");

        let (corpus, report) = load_corpus(config, &self.documents).await?;
        let documents = corpus.document_stats();
        let retrieval = corpus.config();

        if self.json {
            let output = serde_json::json!({
                "report": report,
                "documents": documents,
                "chunkSize": retrieval.chunk_size,
                "chunkOverlap": retrieval.chunk_overlap,
                "embeddingDimension": retrieval.embedding_dimension,
                "metric": retrieval.similarity_metric,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!(
                "Indexed {} document(s), {} page(s), {} chunk(s) in {:.2}s",
                report.documents, report.pages, report.chunks, report.duration_secs
            );
            println!(
                "  Chunk size: {} (overlap {}), dimension {}, metric {}",
                retrieval.chunk_size,
                retrieval.chunk_overlap,
                retrieval.embedding_dimension,
                retrieval.similarity_metric.as_str()
            );
            println!();

            for document in &documents {
                println!("{} ({})", document.source_name, document.id);
                println!("  Pages: {}", document.pages);
                println!("  Chunks: {}", document.chunks);
            }

            if !report.failures.is_empty() {
                println!();
                println!("Skipped:");
                for failure in &report.failures {
                    println!("  {} [{}]: {}", failure.source_name, failure.kind, failure.message);
                }
            }
        }

        Ok(())
    }
}
