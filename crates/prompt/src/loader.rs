//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use folio_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the built-in grounded-answer prompt.
pub const DEFAULT_PROMPT_ID: &str = "answer.default";

const DEFAULT_SYSTEM: &str = "You answer questions about the user's documents. \
Use only the numbered passages you are given. If they do not contain the answer, \
say that you don't have enough information. Cite passages by their number.";

const DEFAULT_TEMPLATE: &str = "Passages:\n\
{{#each passages}}\n\
[{{index}}] {{sourceName}}, page {{pageNumber}}\n\
{{text}}\n\
\n\
{{/each}}\n\
Question: {{question}}\n\
Answer:";

/// The built-in grounded-answer prompt.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: DEFAULT_PROMPT_ID.to_string(),
        title: "Grounded answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "folio".to_string(),
        system: Some(DEFAULT_SYSTEM.to_string()),
        template: DEFAULT_TEMPLATE.to_string(),
    }
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".folio/prompts")
}

/// Load a prompt definition by ID from the workspace.
///
/// Looks for `<id>.yml` in `.folio/prompts/`. When no such file exists and
/// `prompt_id` is [`DEFAULT_PROMPT_ID`], the built-in definition is returned.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.folio/`
/// * `prompt_id` - Prompt identifier (e.g., "answer.default")
///
/// # Example
/// ```no_run
/// use folio_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        if prompt_id == DEFAULT_PROMPT_ID {
            tracing::debug!("Using built-in prompt: {}", DEFAULT_PROMPT_ID);
            return Ok(default_answer_prompt());
        }
        let available = list_prompts(workspace_path)?;
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?} (available: {})",
            prompt_file,
            if available.is_empty() {
                DEFAULT_PROMPT_ID.to_string()
            } else {
                available.join(", ")
            }
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List the prompt IDs defined in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids: Vec<String> = walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().and_then(|s| s.to_str()) == Some("yml")
        })
        .filter_map(|e| {
            e.path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect();

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if !def.template.contains("{{question}}") {
        tracing::warn!(
            "Prompt {} does not reference {{{{question}}}}; the question will not reach the model",
            def.id
        );
    }

    Ok(())
}
