//! Sliding-window chunking of page text.
//!
//! Sizes are counted in characters (Unicode scalar values). Window `i` of a
//! page starts at character `i * (chunk_size - chunk_overlap)` and spans
//! `chunk_size` characters, clipped to the page end. The sequence stops after
//! the first window that reaches the end of the page, so consecutive windows
//! always share exactly `chunk_overlap` characters and dropping that shared
//! prefix from every window but the first rebuilds the page text.

use crate::types::{Chunk, Document, Page};
use folio_core::{AppError, AppResult, RetrievalConfig};

/// Splits pages into overlapping fixed-size windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker; requires `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> AppResult<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Chunk one page of a document. An empty page yields no chunks.
    pub fn chunk_page(&self, document_id: &str, source_name: &str, page: &Page) -> Vec<Chunk> {
        let text = page.text.as_str();
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let n = offsets.len();
        let byte_at = |k: usize| if k < n { offsets[k] } else { text.len() };

        let mut chunks = Vec::with_capacity(window_count(n, self.chunk_size, self.chunk_overlap));
        let mut start = 0;

        while start < n {
            let end = (start + self.chunk_size).min(n);
            let position = chunks.len();

            chunks.push(Chunk {
                id: format!("{}:p{}:c{}", document_id, page.page_number, position),
                document_id: document_id.to_string(),
                source_name: source_name.to_string(),
                page_number: page.page_number,
                position,
                char_start: start,
                text: text[byte_at(start)..byte_at(end)].to_string(),
            });

            if end == n {
                break;
            }
            start += self.step();
        }

        chunks
    }

    /// Chunk every page of a document, in page order.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = document
            .pages
            .iter()
            .flat_map(|page| self.chunk_page(&document.id, &document.source_name, page))
            .collect();

        tracing::debug!(
            "Chunked '{}' into {} chunks across {} pages (size: {}, overlap: {})",
            document.source_name,
            chunks.len(),
            document.pages.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }
}

/// Number of windows produced for a page of `len` characters.
pub fn window_count(len: usize, chunk_size: usize, chunk_overlap: usize) -> usize {
    if len == 0 {
        0
    } else if len <= chunk_size {
        1
    } else {
        let step = chunk_size - chunk_overlap;
        1 + (len - chunk_size).div_ceil(step)
    }
}
