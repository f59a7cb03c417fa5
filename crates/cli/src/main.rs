//! Folio CLI
//!
//! Main entry point for the folio command-line tool.
//! Answers questions about documents with attributed, highlighted sources.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChunksCommand, SearchCommand};
use folio_core::{
    config::{AppConfig, SimilarityMetric},
    logging, AppResult, LogFormat,
};
use std::path::PathBuf;

/// Folio - question answering over your documents
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Question answering over your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "FOLIO_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format (pretty, json)
    #[arg(long, global = true, env = "FOLIO_LOG_FORMAT")]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output (also set by the presence of NO_COLOR)
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "FOLIO_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "FOLIO_MODEL")]
    model: Option<String>,

    /// Similarity metric for retrieval (cosine, euclidean)
    #[arg(long, global = true, env = "FOLIO_METRIC")]
    metric: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer questions about documents
    Ask(AskCommand),

    /// Show the passages that best match a query
    Search(SearchCommand),

    /// Show ingestion statistics for documents
    Chunks(ChunksCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let log_format = cli.log_format.as_deref().map(LogFormat::parse).transpose()?;

    // Load base configuration from environment and the default config file
    let mut config = AppConfig::load()?;

    // A workspace or config file given on the command line brings its own YAML
    if cli.workspace.is_some() || cli.config.is_some() {
        config = config
            .with_overrides(cli.workspace, cli.config, None, None, None, None, false, false)
            .merge_config_file()?;
    }

    // Apply CLI overrides
    let mut config = config.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        log_format,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;

    tracing::info!("Folio CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    apply_metric(&mut config, cli.metric.as_deref())?;
    config.retrieval.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Chunks(_) => "chunks",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Chunks(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!(kind = e.kind(), "Command failed: {}", e),
    }

    result
}

/// Override the configured similarity metric.
fn apply_metric(config: &mut AppConfig, metric: Option<&str>) -> AppResult<()> {
    if let Some(metric) = metric {
        config.retrieval.similarity_metric = SimilarityMetric::parse(metric)?;
        tracing::debug!("Similarity metric: {}", config.retrieval.similarity_metric.as_str());
    }
    Ok(())
}
