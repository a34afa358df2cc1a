//! Embedding providers for knowledge bases.
//!
//! Provider-agnostic embedding generation with per-base configuration.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use ragkit_core::{AppError, AppResult};

/// Embed `texts` in slices of at most `batch_size`.
///
/// Checks the provider kept its contract: one vector per input, each of
/// `provider.dimensions()` finite components. A provider that breaks it is treated
/// as an unavailable backend.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    tracing::info!(
        "Embedding {} texts using provider '{}' (model: {})",
        texts.len(),
        provider.provider_name(),
        provider.model_name()
    );

    let dimensions = provider.dimensions();
    let mut embeddings = Vec::with_capacity(texts.len());

    for (batch_index, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        let vectors = provider.embed_many(batch).await?;

        if vectors.len() != batch.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Provider '{}' returned {} vectors for {} texts",
                provider.provider_name(),
                vectors.len(),
                batch.len()
            )));
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Provider '{}' returned a {}-dimensional vector, expected {}",
                provider.provider_name(),
                bad.len(),
                dimensions
            )));
        }

        if vectors.iter().any(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Provider '{}' returned a vector with non-finite components",
                provider.provider_name()
            )));
        }

        tracing::debug!("Embedded batch {} ({} texts)", batch_index, batch.len());
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashingProvider;

    #[derive(Debug)]
    struct ShortProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn provider_name(&self) -> &str {
            "short"
        }

        fn model_name(&self) -> &str {
            "short-v1"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
        }
    }

    #[derive(Debug)]
    struct NanProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for NanProvider {
        fn provider_name(&self) -> &str {
            "nan"
        }

        fn model_name(&self) -> &str {
            "nan-v1"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![f32::NAN, 1.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_non_finite_vector_is_embedding_unavailable() {
        let texts = vec!["text".to_string()];
        let err = embed_in_batches(&NanProvider, &texts, 8).await.unwrap_err();
        assert!(matches!(err, AppError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let provider = HashingProvider::new(64);
        let texts: Vec<String> = (0..7).map(|i| format!("document number {}", i)).collect();

        let batched = embed_in_batches(&provider, &texts, 3).await.unwrap();
        let whole = provider.embed_many(&texts).await.unwrap();

        assert_eq!(batched, whole);
    }

    #[tokio::test]
    async fn test_wrong_width_is_embedding_unavailable() {
        let texts = vec!["text".to_string()];
        let err = embed_in_batches(&ShortProvider, &texts, 8).await.unwrap_err();
        assert!(matches!(err, AppError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let provider = HashingProvider::new(8);
        assert!(embed_in_batches(&provider, &[], 8).await.unwrap().is_empty());
    }
}
