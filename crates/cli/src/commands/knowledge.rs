//! Knowledge base command handlers: ingest, retrieve, stats and clean.

use super::{generation_client, open_base};
use clap::Args;
use ragkit_core::{config::AppConfig, AppResult};
use ragkit_knowledge::rag::truncate_snippet;
use ragkit_knowledge::{discover_sources, KnowledgeBase};
use std::path::PathBuf;

/// Characters of chunk text shown per hit in human-readable output
const SNIPPET_CHARS: usize = 160;

/// Ingest sources into a knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Knowledge base name
    pub base: String,

    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Discard the saved index and rebuild from these sources only
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for base '{}'", self.base);

        let mut base = if self.reset {
            tracing::info!("Resetting knowledge base '{}'", self.base);
            let llm = generation_client(config)?;
            KnowledgeBase::create(&config.workspace, &self.base, llm, config.model.clone())?
        } else {
            open_base(config, &self.base).await?
        };

        let sources = discover_sources(&self.paths)?;
        let stats = base.pipeline.ingest(&sources).await?;
        base.save().await?;

        if self.json {
            let output = serde_json::json!({
                "base": self.base,
                "sourcesCount": stats.sources_count,
                "chunksCount": stats.chunks_count,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Ingested {} sources ({} chunks, {} bytes) in {:.2}s",
                stats.sources_count, stats.chunks_count, stats.bytes_processed, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Show the chunks closest to a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Knowledge base name
    pub base: String,

    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default: the base's top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command for base '{}'", self.base);

        let base = open_base(config, &self.base).await?;
        let k = self.top_k.unwrap_or(base.config.top_k);
        let hits = base.pipeline.retrieve(&self.query, k).await?;

        if self.json {
            let output: Vec<serde_json::Value> = hits
                .iter()
                .map(|(doc, distance)| {
                    serde_json::json!({
                        "content": doc.content,
                        "metadata": doc.metadata,
                        "distance": distance,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if hits.is_empty() {
            println!("No documents in knowledge base '{}'", self.base);
        } else {
            for (rank, (doc, distance)) in hits.iter().enumerate() {
                println!(
                    "{}. {} #{} (distance {:.4})",
                    rank + 1,
                    doc.metadata.source,
                    doc.metadata.chunk_index,
                    distance
                );
                println!("   {}", truncate_snippet(&doc.content, SNIPPET_CHARS));
            }
        }

        Ok(())
    }
}

/// Show knowledge base stats
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Knowledge base name
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for base '{}'", self.base);

        let base = open_base(config, &self.base).await?;
        let stats = base.pipeline.stats().await;

        if self.json {
            let output = serde_json::json!({
                "base": base.name(),
                "sourcesCount": stats.sources_count,
                "documentsCount": stats.documents_count,
                "dimension": stats.dimension,
                "embeddingProvider": base.config.embedding.provider,
                "embeddingModel": base.config.embedding.model,
                "indexDir": base.index_dir(),
                "savedAt": base.saved_at(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Knowledge base: {}", base.name());
            println!("  Sources: {}", stats.sources_count);
            println!("  Chunks: {}", stats.documents_count);
            println!(
                "  Embeddings: {} / {} ({} dimensions)",
                base.config.embedding.provider, base.config.embedding.model, stats.dimension
            );
            println!("  Index: {}", base.index_dir().display());
            match base.saved_at() {
                Some(saved_at) => println!("  Last saved: {}", saved_at.to_rfc3339()),
                None => println!("  Last saved: never"),
            }
        }

        Ok(())
    }
}

/// Delete a knowledge base's saved index
#[derive(Args, Debug)]
pub struct CleanCommand {
    /// Knowledge base name
    pub base: String,
}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command for base '{}'", self.base);

        if ragkit_knowledge::clean(&config.workspace, &self.base)? {
            println!("Knowledge base '{}' cleaned", self.base);
        } else {
            println!("Knowledge base '{}' has no saved index", self.base);
        }

        Ok(())
    }
}
