//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{HashingProvider, OllamaProvider};
use ragkit_core::{AppError, AppResult};
use std::sync::Arc;

/// Maps text to fixed-width vectors.
///
/// A backend that cannot be reached, or that answers with a vector of the
/// wrong width, yields `AppError::EmbeddingUnavailable`. Implementations
/// never fall back to a local model and never retry.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "hashing")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Width of every vector this provider returns
    fn dimensions(&self) -> usize;

    /// Embed many texts. One vector per input, in input order.
    async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_many(&[text.to_string()]).await?;
        match (results.pop(), results.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(AppError::EmbeddingUnavailable(format!(
                "{} returned an unexpected number of vectors for one input",
                self.provider_name()
            ))),
        }
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingProvider::new(config.dimensions))),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'",
            other
        ))),
    }
}
