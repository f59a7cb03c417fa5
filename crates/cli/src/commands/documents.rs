//! Document loading shared by the commands.
//!
//! Every command builds an in-memory corpus from the documents named on the
//! command line; nothing is persisted between runs.

use clap::Args;
use folio_core::{config::AppConfig, AppError, AppResult};
use folio_knowledge::{Corpus, EmbeddingEngine, IngestReport, PlainTextPageSource, Upload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Documents to ingest before running the command
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Document file or directory (repeatable)
    #[arg(long = "doc", required = true)]
    pub docs: Vec<PathBuf>,
}

impl DocumentArgs {
    /// Read every document, expanding directories recursively.
    pub fn collect_uploads(&self) -> AppResult<Vec<Upload>> {
        let mut uploads = Vec::new();

        for path in &self.docs {
            if path.is_file() {
                uploads.push(Upload::from_path(path)?);
            } else if path.is_dir() {
                for entry in WalkDir::new(path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                    .filter_map(|e| e.ok())
                {
                    if entry.file_type().is_file() {
                        uploads.push(Upload::from_path(entry.path())?);
                    }
                }
            } else {
                return Err(AppError::Config(format!(
                    "Document path does not exist: {:?}",
                    path
                )));
            }
        }

        tracing::debug!("Collected {} document(s)", uploads.len());
        Ok(uploads)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Build a corpus from the configuration and ingest `docs` into it.
pub async fn load_corpus(
    config: &AppConfig,
    docs: &DocumentArgs,
) -> AppResult<(Corpus, IngestReport)> {
    let uploads = docs.collect_uploads()?;
    let engine = EmbeddingEngine::from_config(config)?;
    let corpus = Corpus::new(
        config.retrieval.clone(),
        engine,
        Arc::new(PlainTextPageSource::new()),
    )?;

    let report = corpus.ingest(uploads).await?;
    for failure in &report.failures {
        eprintln!("warning: skipped {}: {}", failure.source_name, failure.message);
    }

    Ok((corpus, report))
}
