//! Page extraction and scoped upload staging.
//!
//! Turning a document byte stream into page text sits behind the
//! [`PageSource`] trait. The built-in [`PlainTextPageSource`] understands
//! UTF-8 text where pages are separated by form feeds, which is what
//! `pdftotext` emits; binary formats need their own source.

use crate::types::{Page, Upload};
use folio_core::IngestionError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Page separator used by `pdftotext` and similar converters.
const PAGE_BREAK: char = '\u{000C}';

/// Extensions the plain text source refuses outright.
const BINARY_FORMATS: &[&str] = &["pdf", "doc", "docx", "odt", "epub", "rtf"];

/// Extracts ordered pages from a staged document.
pub trait PageSource: Send + Sync + std::fmt::Debug {
    /// Source name for logs (e.g., "plain-text")
    fn name(&self) -> &str;

    /// Read the document at `path` and return its pages in order.
    ///
    /// `source_name` is the name the caller uploaded the document under;
    /// `path` is its staged copy and may carry a different file name.
    fn extract(&self, source_name: &str, path: &Path) -> Result<Vec<Page>, IngestionError>;
}

/// Page source for UTF-8 text and markdown files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextPageSource;

impl PlainTextPageSource {
    pub fn new() -> Self {
        Self
    }
}

impl PageSource for PlainTextPageSource {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn extract(&self, source_name: &str, path: &Path) -> Result<Vec<Page>, IngestionError> {
        if let Some(ext) = Path::new(source_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
        {
            if BINARY_FORMATS.contains(&ext.as_str()) {
                return Err(IngestionError::UnsupportedFormat {
                    source_name: source_name.to_string(),
                    format: ext,
                });
            }
        }

        let bytes = std::fs::read(path).map_err(|e| IngestionError::Unreadable {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;

        let raw = String::from_utf8(bytes).map_err(|e| IngestionError::Unreadable {
            source_name: source_name.to_string(),
            reason: format!("not valid UTF-8: {}", e.utf8_error()),
        })?;

        if !is_likely_text(&raw) {
            return Err(IngestionError::Unreadable {
                source_name: source_name.to_string(),
                reason: "binary content".to_string(),
            });
        }

        Ok(split_pages(&raw))
    }
}

/// Split normalized text into 1-based pages on form feeds.
///
/// A trailing form feed does not open an extra empty page.
pub fn split_pages(raw: &str) -> Vec<Page> {
    let text = raw.replace("\r\n", "\n");
    let body = text.strip_suffix(PAGE_BREAK).unwrap_or(&text);

    body.split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| Page::new(i as u32 + 1, page))
        .collect()
}

/// Check if text is likely text and not binary.
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}

/// An upload written to a temporary file for the duration of extraction.
///
/// The file is removed when this value is dropped, whichever way the
/// extraction ends.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `upload` to a fresh temporary file, keeping its extension.
    pub fn stage(upload: &Upload) -> Result<Self, IngestionError> {
        let suffix = upload
            .extension()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let staging_error = |e: std::io::Error| IngestionError::Staging {
            source_name: upload.source_name.clone(),
            reason: e.to_string(),
        };

        let mut file = tempfile::Builder::new()
            .prefix("folio-upload-")
            .suffix(&suffix)
            .tempfile()
            .map_err(staging_error)?;

        file.write_all(&upload.bytes).map_err(staging_error)?;
        file.flush().map_err(staging_error)?;

        tracing::debug!(
            "Staged '{}' ({} bytes) at {:?}",
            upload.source_name,
            upload.bytes.len(),
            file.path()
        );

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Stage an upload, extract its pages and release the staged file.
pub fn extract_pages(source: &dyn PageSource, upload: &Upload) -> Result<Vec<Page>, IngestionError> {
    let staged = StagedUpload::stage(upload)?;
    source.extract(&upload.source_name, staged.path())
}
