//! Knowledge base configuration management.

use crate::chunker::{self, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embeddings::EmbeddingConfig;
use crate::rag::types::{
    GenerationFailurePolicy, RagOptions, DEFAULT_INGEST_CONCURRENCY, DEFAULT_TOP_K,
};
use ragkit_core::config::STATE_DIR;
use ragkit_core::{AppError, AppResult};
use ragkit_llm::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    #[serde(default)]
    pub name: String,

    /// Chunk width in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Documents retrieved per question unless overridden
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub generation_failure_policy: GenerationFailurePolicy,

    /// Sources loaded and chunked at the same time during ingest
    #[serde(default = "default_ingest_concurrency")]
    pub ingest_concurrency: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_ingest_concurrency() -> usize {
    DEFAULT_INGEST_CONCURRENCY
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            embedding: EmbeddingConfig::default(),
            top_k: default_top_k(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            generation_failure_policy: GenerationFailurePolicy::default(),
            ingest_concurrency: default_ingest_concurrency(),
        }
    }
}

impl KnowledgeBaseConfig {
    /// Check the settings before any work is done with them.
    pub fn validate(&self) -> AppResult<()> {
        chunker::validate_params(self.chunk_size, self.chunk_overlap)?;
        self.embedding.validate()?;

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be greater than 0".to_string()));
        }

        if self.ingest_concurrency == 0 {
            return Err(AppError::Config(
                "ingest_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Pipeline options derived from this base's settings.
    pub fn rag_options(&self, model: impl Into<String>) -> RagOptions {
        RagOptions {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            embedding_batch_size: self.embedding.batch_size,
            ingest_concurrency: self.ingest_concurrency,
            model: model.into(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            generation_failure_policy: self.generation_failure_policy,
        }
    }
}

/// Load knowledge base configuration.
///
/// Loads from `.ragkit/knowledge/<base>/config.yaml` if it exists,
/// otherwise returns the defaults for the given base name.
pub fn load_config(workspace: &Path, base_name: &str) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, base_name);

    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        // The directory name wins
        config.name = base_name.to_string();

        tracing::debug!("Loaded knowledge base config for '{}'", base_name);
        config
    } else {
        tracing::debug!(
            "Using default knowledge base config for '{}' (no config file found)",
            base_name
        );
        KnowledgeBaseConfig {
            name: base_name.to_string(),
            ..Default::default()
        }
    };

    config.validate()?;
    Ok(config)
}

/// Save knowledge base configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    config.validate()?;
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge base config for '{}'", config.name);
    Ok(())
}

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    workspace.join(STATE_DIR).join("knowledge").join(base_name)
}

/// Get the path to a base's config file.
pub fn get_config_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("config.yaml")
}

/// Get the directory holding a base's saved index.
pub fn get_index_dir(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), "test-base").unwrap();

        assert_eq!(config.name, "test-base");
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.chunk_overlap, 50);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeBaseConfig {
            name: "my-base".to_string(),
            chunk_size: 256,
            embedding: EmbeddingConfig::hashing(128),
            generation_failure_policy: GenerationFailurePolicy::Degrade,
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path(), "my-base").unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path(), "docs");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "name: ignored\nchunk_size: 300\nembedding:\n  provider: hashing\n  model: trigram-v1\n  dimensions: 64\n",
        )
        .unwrap();

        let config = load_config(temp.path(), "docs").unwrap();
        assert_eq!(config.name, "docs");
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.embedding.dimensions, 64);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_overlap_not_smaller_than_chunk_size_rejected() {
        let config = KnowledgeBaseConfig {
            chunk_size: 50,
            chunk_overlap: 50,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_paths() {
        let ws = Path::new("/ws");
        assert_eq!(
            get_index_dir(ws, "docs"),
            PathBuf::from("/ws/.ragkit/knowledge/docs/index")
        );
        assert_eq!(
            get_config_path(ws, "docs"),
            PathBuf::from("/ws/.ragkit/knowledge/docs/config.yaml")
        );
    }
}
