//! Answer request and response types.

use folio_core::{HighlightPolicy, RetrievalConfig};
use serde::{Deserialize, Serialize};

/// How source passages are turned into display snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetOptions {
    /// Maximum characters of source text per snippet
    pub max_chars: usize,
    pub policy: HighlightPolicy,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl SnippetOptions {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            max_chars: config.snippet_length,
            policy: config.highlight_policy,
        }
    }
}

/// A question asked against the published snapshot.
#[derive(Debug, Clone, Default)]
pub struct AskRequest {
    pub query: String,
    /// Passages to retrieve; the configured default when `None`
    pub top_k: Option<usize>,
    /// Restrict retrieval to these documents
    pub document_ids: Option<Vec<String>>,
    pub snippet: SnippetOptions,
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_documents(mut self, document_ids: Vec<String>) -> Self {
        self.document_ids = Some(document_ids);
        self
    }

    pub fn with_snippet(mut self, snippet: SnippetOptions) -> Self {
        self.snippet = snippet;
        self
    }
}

/// A passage the answer is attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Uploaded file name (e.g., "handbook.txt")
    pub source_name: String,

    /// 1-based page the passage comes from
    pub page_number: u32,

    /// Highlighted, single-line display text of the passage
    pub snippet: String,

    /// Similarity score under the index metric
    pub score: f32,

    /// 0-based retrieval rank
    pub rank: usize,
}

/// Answer with its supporting passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Snapshot the passages were retrieved from
    pub snapshot_version: u64,
}

impl AnswerResponse {
    /// Response for a query that matched no passage.
    pub fn no_information(query: &str, snapshot_version: u64) -> Self {
        Self {
            answer: format!(
                "I could not find information about \"{}\" in the uploaded documents.",
                query
            ),
            sources: Vec::new(),
            snapshot_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_information_response() {
        let response = AnswerResponse::no_information("refund window", 3);

        assert!(response.answer.contains("refund window"));
        assert!(response.answer.contains("could not find"));
        assert!(response.sources.is_empty());
        assert_eq!(response.snapshot_version, 3);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = AnswerResponse {
            answer: "Fourteen days.".to_string(),
            sources: vec![SourceRef {
                source_name: "handbook.txt".to_string(),
                page_number: 2,
                snippet: "<mark>Refunds</mark> take fourteen days".to_string(),
                score: 0.5,
                rank: 0,
            }],
            snapshot_version: 1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sources"][0]["sourceName"], "handbook.txt");
        assert_eq!(json["sources"][0]["pageNumber"], 2);
        assert_eq!(json["snapshotVersion"], 1);

        let back: AnswerResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn test_ask_request_defaults() {
        let request = AskRequest::new("How long do refunds take?").with_top_k(5);

        assert_eq!(request.top_k, Some(5));
        assert!(request.document_ids.is_none());
        assert_eq!(request.snippet.max_chars, 800);
        assert_eq!(request.snippet.policy, HighlightPolicy::TruncateThenHighlight);
    }
}
