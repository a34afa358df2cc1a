//! ragkit CLI
//!
//! Main entry point for the ragkit command-line tool.
//! Ingests documents into local knowledge bases and answers questions
//! grounded in them.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{
    AskCommand, CleanCommand, IngestCommand, RetrieveCommand, StatsCommand,
};
use ragkit_core::config::AppConfig;
use ragkit_core::logging::{self, LogFormat};
use ragkit_core::AppError;
use std::path::PathBuf;

/// ragkit - retrieval-augmented generation over local documents
#[derive(Parser, Debug)]
#[command(name = "ragkit")]
#[command(about = "Retrieval-augmented generation over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGKIT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama)
    #[arg(short, long, global = true, env = "RAGKIT_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "RAGKIT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk, embed and index sources into a knowledge base
    Ingest(IngestCommand),

    /// Show the chunks closest to a query
    Retrieve(RetrieveCommand),

    /// Answer a question grounded in a knowledge base
    Ask(AskCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),

    /// Delete a knowledge base's saved index
    Clean(CleanCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()
        .context("Failed to load configuration")?
        .with_overrides(
            cli.workspace,
            cli.config,
            cli.provider,
            cli.model,
            cli.log_level,
            cli.verbose,
            cli.no_color,
        );

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        LogFormat::parse(&config.log_format),
    )?;

    tracing::info!("ragkit starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate().context("Invalid configuration")?;
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Retrieve(_) => "retrieve",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
        Commands::Clean(_) => "clean",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clean(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.map_err(|e| {
        let message = failure_message(command_name, &e);
        anyhow::Error::new(e).context(message)
    })
}

/// Top-level error message, with a next step for the error classes a user
/// can act on.
fn failure_message(command: &str, err: &AppError) -> String {
    if err.is_backend() {
        format!(
            "{} failed: model backend unavailable (is the provider running and reachable?)",
            command
        )
    } else if err.is_integrity() {
        format!(
            "{} failed: index data is inconsistent (rebuild with `ragkit ingest <base> <paths> --reset` or remove it with `ragkit clean <base>`)",
            command
        )
    } else {
        format!("{} failed", command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_names_backend_outage() {
        let err = AppError::EmbeddingUnavailable("connection refused".to_string());
        assert!(failure_message("ask", &err).contains("backend unavailable"));
    }

    #[test]
    fn test_failure_message_suggests_rebuild_for_damaged_index() {
        let err = AppError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        let message = failure_message("retrieve", &err);
        assert!(message.starts_with("retrieve failed"));
        assert!(message.contains("--reset"));
    }

    #[test]
    fn test_failure_message_plain_for_other_errors() {
        let err = AppError::Config("bad".to_string());
        assert_eq!(failure_message("stats", &err), "stats failed");
    }

    #[test]
    fn test_cli_parses_ingest() {
        let cli = Cli::try_parse_from(["ragkit", "ingest", "docs", "a.md", "b.txt", "--reset"])
            .unwrap();
        match cli.command {
            Commands::Ingest(cmd) => {
                assert_eq!(cmd.base, "docs");
                assert_eq!(cmd.paths.len(), 2);
                assert!(cmd.reset);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
