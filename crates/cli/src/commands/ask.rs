//! Ask command handler.
//!
//! Answers a question from a knowledge base through the configured
//! generation provider.

use super::open_base;
use clap::Args;
use ragkit_core::{config::AppConfig, AppResult};

/// Answer a question grounded in a knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Knowledge base name
    pub base: String,

    /// Question text
    pub query: String,

    /// Number of chunks to ground the answer on (default: the base's top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for base '{}'", self.base);

        let base = open_base(config, &self.base).await?;
        if base.pipeline.stats().await.documents_count == 0 {
            tracing::warn!(
                "Knowledge base '{}' is empty; the answer will not be grounded",
                self.base
            );
        }

        let k = self.top_k.unwrap_or(base.config.top_k);
        let response = base.pipeline.generate(&self.query, k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        println!("Answer:");
        println!("{}", response.response);
        println!();

        if response.retrieved_documents.is_empty() {
            println!("Sources: (no sources available)");
        } else {
            println!("Sources:");
            for (i, doc) in response.retrieved_documents.iter().enumerate() {
                println!(
                    "[Document {}] {} #{} (distance {:.4})",
                    i + 1,
                    doc.metadata.source,
                    doc.metadata.chunk_index,
                    doc.similarity_score
                );
            }
        }

        Ok(())
    }
}
