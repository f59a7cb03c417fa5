//! Prompt types for Folio.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// System message sent alongside the rendered template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax.
    ///
    /// Available variables: `question` and `passages` (each with `index`,
    /// `sourceName`, `pageNumber`, `text`).
    pub template: String,
}

/// A retrieved passage as exposed to the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPassage {
    /// 1-based position in the retrieved list
    pub index: usize,
    pub source_name: String,
    pub page_number: u32,
    pub text: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of passages rendered into the prompt
    #[serde(rename = "passageCount")]
    pub passage_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: answer.terse
title: Terse answer
apiVersion: "1.0"
system: "Answer in one sentence."
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "answer.terse");
        assert_eq!(def.system.as_deref(), Some("Answer in one sentence."));
        assert!(def.created_by.is_empty());
    }

    #[test]
    fn test_passage_serializes_camel_case() {
        let passage = PromptPassage {
            index: 1,
            source_name: "handbook.txt".to_string(),
            page_number: 2,
            text: "Refunds take 14 days.".to_string(),
        };

        let json = serde_json::to_value(&passage).unwrap();
        assert_eq!(json["sourceName"], "handbook.txt");
        assert_eq!(json["pageNumber"], 2);
    }
}
