//! Retrieval data model: documents, pages, chunks and results.

use folio_core::{AppError, AppResult, IngestionError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// One page of extracted document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub page_number: u32,
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A document as received from the caller, before extraction.
#[derive(Debug, Clone)]
pub struct Upload {
    /// File name shown in attributions (e.g. "handbook.txt")
    pub source_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(source_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source_name: source_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; the source name is its file name.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::Other(format!("Path has no file name: {:?}", path)))?;

        let bytes = std::fs::read(path)?;
        Ok(Self { source_name, bytes })
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.source_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }
}

/// An ingested document. Immutable; lives as long as the snapshot holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    pub source_name: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document from the `ordinal`-th upload of a batch (1-based).
    pub fn new(ordinal: usize, upload: &Upload, pages: Vec<Page>) -> Self {
        Self {
            id: document_id(ordinal, &upload.source_name, &upload.bytes),
            source_name: upload.source_name.clone(),
            pages,
        }
    }
}

/// Stable document identifier: `doc-<ordinal>-<12 hex chars of sha256(name, bytes)>`.
///
/// The ordinal keeps two uploads of identical files apart within a batch.
pub fn document_id(ordinal: usize, source_name: &str, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());
    format!("doc-{}-{}", ordinal, &digest[..12])
}

/// A page-scoped text window, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<document_id>:p<page>:c<position>`
    pub id: String,
    pub document_id: String,
    pub source_name: String,
    pub page_number: u32,
    /// 0-based window index within the page
    pub position: usize,
    /// Character offset of the window within the page text
    pub char_start: usize,
    pub text: String,
}

impl Chunk {
    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A chunk with its embedding attached. The vector cannot change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn into_parts(self) -> (Chunk, Vec<f32>) {
        (self.chunk, self.vector)
    }
}

/// Index-level search result.
///
/// `entry` is the insertion index of the matched vector. The meaning of
/// `score` depends on the metric: cosine similarity (higher is better) or
/// Euclidean distance (lower is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub entry: usize,
    pub score: f32,
}

/// A search result resolved back to its chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    /// 0-based rank, best match first
    pub rank: usize,
    pub score: f32,
    pub chunk: Chunk,
}

/// Per-document statistics of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub source_name: String,
    pub pages: usize,
    pub chunks: usize,
}

/// A document that could not be ingested, reported alongside the batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFailure {
    pub source_name: String,
    /// "unreadable", "unsupportedFormat" or "staging"
    pub kind: String,
    pub message: String,
    #[serde(skip)]
    pub error: IngestionError,
}

impl DocumentFailure {
    pub fn new(source_name: impl Into<String>, error: IngestionError) -> Self {
        let kind = match error {
            IngestionError::Unreadable { .. } => "unreadable",
            IngestionError::UnsupportedFormat { .. } => "unsupportedFormat",
            IngestionError::Staging { .. } => "staging",
            IngestionError::NothingIndexed { .. } => "nothingIndexed",
            IngestionError::InProgress => "inProgress",
        };

        Self {
            source_name: source_name.into(),
            kind: kind.to_string(),
            message: error.to_string(),
            error,
        }
    }
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Version of the snapshot this batch published
    pub snapshot_version: u64,
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub failures: Vec<DocumentFailure>,
    pub duration_secs: f64,
}
