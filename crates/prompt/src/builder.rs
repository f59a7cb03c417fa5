//! Prompt builder for rendering templates with retrieved passages.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptPassage};
use folio_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::json;

/// Build a prompt from a definition, the user question and its passages.
///
/// # Arguments
/// * `definition` - Prompt definition (workspace YAML or built-in)
/// * `question` - The user question, verbatim
/// * `passages` - Retrieved passages in rank order
///
/// # Example
/// ```no_run
/// use folio_prompt::{build_prompt, default_answer_prompt, PromptPassage};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let passages = vec![PromptPassage {
///     index: 1,
///     source_name: "handbook.txt".to_string(),
///     page_number: 1,
///     text: "Refunds are issued within 14 days.".to_string(),
/// }];
/// let built = build_prompt(&default_answer_prompt(), "How long do refunds take?", &passages)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    passages: &[PromptPassage],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt {} with {} passage(s)",
        definition.id,
        passages.len()
    );

    let data = json!({
        "question": question,
        "passages": passages,
    });

    let user = render_template(&definition.template, &data)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            passage_count: passages.len(),
        },
    })
}

/// Render a Handlebars template without HTML escaping.
fn render_template(template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Passages are plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
