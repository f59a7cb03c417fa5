//! Prompt system for Folio.
//!
//! This crate renders the grounded-answer prompt handed to the generation
//! provider:
//! - YAML-based prompt definitions (`.folio/prompts/<id>.yml`)
//! - A built-in default answer prompt
//! - Handlebars template rendering with the retrieved passages

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_answer_prompt, list_prompts, load_prompt, DEFAULT_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptPassage};
