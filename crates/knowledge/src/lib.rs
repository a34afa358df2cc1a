//! Knowledge base management system.
//!
//! Local-first RAG: sources are chunked, embedded and kept in an exact
//! in-memory vector index that is persisted under
//! `.ragkit/knowledge/<base>/index/`.

pub mod chunker;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod index;
pub mod loader;
pub mod rag;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::KnowledgeBaseConfig;
pub use document::{Document, DocumentMetadata};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::{IndexStats, VectorIndex, BRUTE_FORCE_SOFT_LIMIT};
pub use loader::{discover_sources, DocumentLoader, DocumentProcessor, FileLoader};
pub use rag::{
    GenerationFailurePolicy, IngestStats, RagOptions, RagPipeline, RagResponse,
    RetrievedDocument,
};

use chrono::{DateTime, Utc};
use ragkit_core::AppResult;
use ragkit_llm::LlmClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A named knowledge base in a workspace, wired to its pipeline.
pub struct KnowledgeBase {
    pub config: KnowledgeBaseConfig,
    pub pipeline: RagPipeline,
    workspace: PathBuf,
    index_dir: PathBuf,
    saved_at: Option<DateTime<Utc>>,
}

impl KnowledgeBase {
    /// Open a base, loading its saved index when there is one.
    pub async fn open(
        workspace: &Path,
        base_name: &str,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
    ) -> AppResult<Self> {
        let mut base = Self::create(workspace, base_name, llm, model)?;

        if store::index_exists(&base.index_dir) {
            let loaded = base.pipeline.load(&base.index_dir).await?;
            base.saved_at = Some(loaded.saved_at);
        } else {
            tracing::debug!("No saved index for '{}' yet", base_name);
        }

        Ok(base)
    }

    /// Open a base with an empty index, ignoring anything saved.
    pub fn create(
        workspace: &Path,
        base_name: &str,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
    ) -> AppResult<Self> {
        let config = config::load_config(workspace, base_name)?;
        let embedder = create_provider(&config.embedding)?;
        let prompt = ragkit_prompt::load_rag_prompt(workspace)?;

        let pipeline = RagPipeline::new(
            embedder,
            llm,
            Arc::new(FileLoader::new()),
            prompt,
            config.rag_options(model),
        )?;

        Ok(Self {
            config,
            pipeline,
            workspace: workspace.to_path_buf(),
            index_dir: config::get_index_dir(workspace, base_name),
            saved_at: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// When the loaded index was last saved. `None` for a fresh base.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// Persist the index to the base's index directory.
    ///
    /// A base running on defaults also gets its `config.yaml` written, so
    /// later runs reopen it with the same embedding settings.
    pub async fn save(&mut self) -> AppResult<()> {
        if !config::get_config_path(&self.workspace, &self.config.name).exists() {
            config::save_config(&self.workspace, &self.config)?;
        }

        let saved_at = self.pipeline.save(&self.index_dir).await?;
        self.saved_at = Some(saved_at);
        Ok(())
    }
}

/// Delete a base's saved index. Returns whether there was one.
pub fn clean(workspace: &Path, base_name: &str) -> AppResult<bool> {
    let index_dir = config::get_index_dir(workspace, base_name);
    if !store::index_exists(&index_dir) {
        return Ok(false);
    }

    store::remove_index(&index_dir)?;
    tracing::info!("Removed index for base '{}'", base_name);
    Ok(true)
}
