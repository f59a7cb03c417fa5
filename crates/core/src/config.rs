//! Configuration management for Folio.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.folio/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The resulting `AppConfig` is built once per process and handed down to the
//! ingestion and query pipelines. Nothing reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the workspace root (contains .folio/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider (e.g., "openai", "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Explicit API key for the generation provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Retrieval pipeline settings
    pub retrieval: RetrievalConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Custom endpoint, if configured.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAI { model, .. } | ProviderConfig::Ollama { model, .. } => model,
        }
    }
}

/// Similarity metric used to rank stored vectors against a query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Cosine similarity; higher is more similar.
    #[default]
    Cosine,
    /// Euclidean (L2) distance; lower is more similar.
    Euclidean,
}

impl SimilarityMetric {
    /// Parse a metric name ("cosine", "euclidean", "l2").
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            other => Err(AppError::Config(format!(
                "Unknown similarity metric: {}. Supported: cosine, euclidean",
                other
            ))),
        }
    }

    /// Canonical metric name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
        }
    }
}

/// Order in which display snippets are truncated and highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum HighlightPolicy {
    /// Cut the plain text first, then mark matches. Markup stays balanced.
    #[default]
    TruncateThenHighlight,
    /// Mark matches first, then cut. A cut may land inside a marker.
    HighlightThenTruncate,
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "trigram", "ollama", "openai"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Maximum number of texts per provider call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Custom endpoint for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the provider API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

fn default_embedding_model() -> String {
    "trigram-v1".to_string()
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            endpoint: None,
            api_key_env: None,
        }
    }
}

/// Settings of the retrieval pipeline (chunking, indexing, querying, display).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Window length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive windows of a page
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of passages retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub similarity_metric: SimilarityMetric,

    /// Vector length every chunk and query must have
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Maximum characters of a displayed snippet
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,

    #[serde(default)]
    pub highlight_policy: HighlightPolicy,

    /// Timeout applied to each provider call
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Attempts per provider call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry; doubles on each further retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    3
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_snippet_length() -> usize {
    800
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            similarity_metric: SimilarityMetric::default(),
            embedding_dimension: default_embedding_dimension(),
            embedding: EmbeddingSettings::default(),
            snippet_length: default_snippet_length(),
            highlight_policy: HighlightPolicy::default(),
            provider_timeout_secs: default_provider_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl RetrievalConfig {
    /// Check the invariants between options.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("topK must be positive".to_string()));
        }

        if self.embedding_dimension == 0 {
            return Err(AppError::Config(
                "embeddingDimension must be positive".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be positive".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(AppError::Config("maxAttempts must be positive".to_string()));
        }

        if self.provider_timeout_secs == 0 {
            return Err(AppError::Config(
                "providerTimeoutSecs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    retrieval: Option<RetrievalConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `FOLIO_WORKSPACE`: Override workspace path
    /// - `FOLIO_CONFIG`: Path to config file
    /// - `FOLIO_PROVIDER`: Generation provider
    /// - `FOLIO_MODEL`: Model identifier
    /// - `FOLIO_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("FOLIO_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("FOLIO_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        config = config.merge_config_file()?;

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("FOLIO_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("FOLIO_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("FOLIO_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge the YAML config file (explicit path or `.folio/config.yaml`) if present.
    pub fn merge_config_file(self) -> AppResult<Self> {
        let config_path = match self.config_file {
            Some(ref cf) => cf.clone(),
            None => self.folio_dir().join("config.yaml"),
        };

        if config_path.exists() {
            self.merge_yaml(&config_path)
        } else {
            Ok(self)
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = LogFormat::parse(&format)?;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and files.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(log_format) = log_format {
            self.log_format = log_format;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .folio directory.
    pub fn folio_dir(&self) -> PathBuf {
        self.workspace.join(".folio")
    }

    /// Get the configuration of a provider, if the config file declares it.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key of a provider.
    ///
    /// An explicit `FOLIO_API_KEY` wins; otherwise the provider's `apiKeyEnv`
    /// variable is read, falling back to `OPENAI_API_KEY` for OpenAI.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) = self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(api_key_env) {
                return Some(key);
            }
        }

        if provider.eq_ignore_ascii_case("openai") {
            return std::env::var("OPENAI_API_KEY").ok();
        }

        None
    }

    /// Resolve the API key of the embedding provider.
    pub fn resolve_embedding_api_key(&self) -> Option<String> {
        if let Some(ref env) = self.retrieval.embedding.api_key_env {
            if let Ok(key) = std::env::var(env) {
                return Some(key);
            }
        }

        self.resolve_api_key(&self.retrieval.embedding.provider)
    }

    /// Validate the generation provider and retrieval settings.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openai", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.provider == "openai" && self.resolve_api_key("openai").is_none() {
            return Err(AppError::Config(
                "OpenAI provider requires an API key (FOLIO_API_KEY, apiKeyEnv or OPENAI_API_KEY)"
                    .to_string(),
            ));
        }

        self.retrieval.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert!(!config.verbose);
        assert!(!config.no_color);
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.retrieval.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.similarity_metric, SimilarityMetric::Cosine);
    }

    #[test]
    fn test_folio_dir() {
        let config = AppConfig::default();
        assert!(config.folio_dir().ends_with(".folio"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            None,
            Some(LogFormat::Json),
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o-mini");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
        assert_eq!(overridden.log_format, LogFormat::Json);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retrieval_validation_rejects_overlap_not_below_size() {
        let config = RetrievalConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunkOverlap"));
    }

    #[test]
    fn test_retrieval_validation_rejects_zero_values() {
        for config in [
            RetrievalConfig {
                chunk_size: 0,
                chunk_overlap: 0,
                ..Default::default()
            },
            RetrievalConfig {
                top_k: 0,
                ..Default::default()
            },
            RetrievalConfig {
                embedding_dimension: 0,
                ..Default::default()
            },
            RetrievalConfig {
                max_attempts: 0,
                ..Default::default()
            },
            RetrievalConfig {
                provider_timeout_secs: 0,
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err(), "{:?} should be invalid", config);
        }
    }

    #[test]
    fn test_similarity_metric_parse() {
        assert_eq!(
            SimilarityMetric::parse("Cosine").unwrap(),
            SimilarityMetric::Cosine
        );
        assert_eq!(
            SimilarityMetric::parse("l2").unwrap(),
            SimilarityMetric::Euclidean
        );
        assert!(SimilarityMetric::parse("manhattan").is_err());
    }

    #[test]
    fn test_merge_yaml_retrieval_section() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: openai
  providers:
    openai:
      apiKeyEnv: MY_OPENAI_KEY
      model: gpt-4o-mini
logging:
  level: warn
  format: json
retrieval:
  chunkSize: 500
  chunkOverlap: 50
  similarityMetric: euclidean
  embeddingDimension: 1536
  highlightPolicy: highlightThenTruncate
  embedding:
    provider: openai
    model: text-embedding-3-small
"#,
        )
        .unwrap();

        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            config_file: Some(path),
            ..Default::default()
        }
        .merge_config_file()
        .unwrap();

        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.log_level, Some("warn".to_string()));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(
            config.retrieval.similarity_metric,
            SimilarityMetric::Euclidean
        );
        assert_eq!(config.retrieval.embedding_dimension, 1536);
        assert_eq!(
            config.retrieval.highlight_policy,
            HighlightPolicy::HighlightThenTruncate
        );
        assert_eq!(config.retrieval.embedding.provider, "openai");
        assert_eq!(config.retrieval.embedding.batch_size, 100);
    }

    #[test]
    fn test_missing_config_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        }
        .merge_config_file()
        .unwrap();

        assert_eq!(config.retrieval, RetrievalConfig::default());
    }
}
