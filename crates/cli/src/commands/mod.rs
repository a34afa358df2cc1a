//! Command handlers for the ragkit CLI.

pub mod ask;
pub mod knowledge;

pub use ask::AskCommand;
pub use knowledge::{CleanCommand, IngestCommand, RetrieveCommand, StatsCommand};

use ragkit_core::{config::AppConfig, AppResult};
use ragkit_knowledge::KnowledgeBase;
use ragkit_llm::LlmClient;
use std::sync::Arc;

/// Generation client for the configured provider.
pub(crate) fn generation_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = config
        .provider_config(&config.provider)
        .and_then(|p| p.timeout);
    ragkit_llm::create_client(&config.provider, config.provider_endpoint(), timeout)
}

/// Open a base in the configured workspace with its saved index loaded.
pub(crate) async fn open_base(config: &AppConfig, base: &str) -> AppResult<KnowledgeBase> {
    let llm = generation_client(config)?;
    KnowledgeBase::open(&config.workspace, base, llm, config.model.clone()).await
}
