//! Retrieval-augmented generation over one vector index.

use crate::chunker;
use crate::document::Document;
use crate::embeddings::{embed_in_batches, EmbeddingProvider};
use crate::index::{IndexStats, VectorIndex};
use crate::loader::{DocumentLoader, DocumentProcessor, PreparedSource};
use crate::rag::context::build_context;
use crate::rag::types::{
    GenerationFailurePolicy, IngestStats, RagOptions, RagResponse, RetrievedDocument,
    GENERATION_ERROR_PREFIX,
};
use crate::store::LoadedIndex;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use ragkit_core::{AppError, AppResult};
use ragkit_llm::{LlmClient, LlmRequest};
use ragkit_prompt::{build_prompt, PromptDefinition};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Ingests sources into a vector index and answers questions from it.
///
/// Every collaborator is handed in at construction. The index sits behind a
/// read-write lock: ingest, load and clear take it exclusively, while
/// retrieval, save and stats share it. Embedding work happens before the
/// exclusive lock is taken.
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    loader: Arc<dyn DocumentLoader>,
    prompt: PromptDefinition,
    options: RagOptions,
    index: RwLock<VectorIndex>,
}

impl RagPipeline {
    /// Build a pipeline with an empty index sized to the embedder.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        loader: Arc<dyn DocumentLoader>,
        prompt: PromptDefinition,
        options: RagOptions,
    ) -> AppResult<Self> {
        chunker::validate_params(options.chunk_size, options.chunk_overlap)?;

        if options.ingest_concurrency == 0 {
            return Err(AppError::Config(
                "ingest_concurrency must be greater than 0".to_string(),
            ));
        }
        if options.embedding_batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than 0".to_string(),
            ));
        }

        let index = VectorIndex::new(embedder.dimensions())?;

        tracing::debug!(
            "RAG pipeline ready: embedder={} ({}), generator={}, dimension={}",
            embedder.provider_name(),
            embedder.model_name(),
            llm.provider_name(),
            index.dimension()
        );

        Ok(Self {
            embedder,
            llm,
            loader,
            prompt,
            options,
            index: RwLock::new(index),
        })
    }

    pub fn options(&self) -> &RagOptions {
        &self.options
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Load, chunk, embed and index every source.
    ///
    /// Nothing is committed unless every source succeeds: a failing source
    /// aborts the whole call and the index is left as it was.
    pub async fn ingest(&self, sources: &[String]) -> AppResult<IngestStats> {
        let start_time = Instant::now();

        tracing::info!("Ingesting {} sources", sources.len());

        let processor = DocumentProcessor::new(
            self.loader.as_ref(),
            self.options.chunk_size,
            self.options.chunk_overlap,
        )?;

        let processor = &processor;
        let prepared: Vec<PreparedSource> = stream::iter(sources)
            .map(move |source| processor.process(source))
            .buffered(self.options.ingest_concurrency)
            .try_collect()
            .await?;

        let bytes_processed = prepared.iter().map(|p| p.bytes).sum();
        let mut documents: Vec<Document> = prepared
            .into_iter()
            .flat_map(|p| p.documents)
            .collect();

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = embed_in_batches(
            self.embedder.as_ref(),
            &texts,
            self.options.embedding_batch_size,
        )
        .await?;

        for (doc, embedding) in documents.iter_mut().zip(embeddings) {
            doc.attach_embedding(embedding)?;
        }

        let chunks_count = documents.len();
        self.index.write().await.add(documents)?;

        let stats = IngestStats {
            sources_count: sources.len(),
            chunks_count,
            bytes_processed,
            duration_secs: start_time.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Ingested {} sources into {} chunks ({} bytes) in {:.2}s",
            stats.sources_count,
            stats.chunks_count,
            stats.bytes_processed,
            stats.duration_secs
        );

        Ok(stats)
    }

    /// The `k` indexed documents closest to `query`, nearest first.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<(Document, f32)>> {
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed_one(query).await?;
        if query_embedding.len() != self.embedder.dimensions() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Provider '{}' returned a {}-dimensional query vector, expected {}",
                self.embedder.provider_name(),
                query_embedding.len(),
                self.embedder.dimensions()
            )));
        }
        if query_embedding.iter().any(|x| !x.is_finite()) {
            return Err(AppError::EmbeddingUnavailable(format!(
                "Provider '{}' returned a query vector with non-finite components",
                self.embedder.provider_name()
            )));
        }

        let results = self.index.read().await.search(&query_embedding, k)?;

        tracing::info!("Retrieved {} documents (k={})", results.len(), k);
        Ok(results)
    }

    /// Answer `query` from the `k` closest documents.
    pub async fn generate(&self, query: &str, k: usize) -> AppResult<RagResponse> {
        let hits = self.retrieve(query, k).await?;

        let context = build_context(hits.iter().map(|(doc, _)| doc));
        let built = build_prompt(&self.prompt, query, &context)?;

        let mut request = LlmRequest::new(built.user, self.options.model.clone())
            .with_max_tokens(self.options.max_tokens)
            .with_temperature(self.options.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Generating with {} (prompt: {}, {} context documents)",
            self.llm.provider_name(),
            built.source_prompt_id,
            hits.len()
        );

        let (response, generation_failed) = match self.llm.complete(&request).await {
            Ok(completion) => (completion.content, false),
            Err(e) => match self.options.generation_failure_policy {
                GenerationFailurePolicy::Propagate => return Err(e),
                GenerationFailurePolicy::Degrade => {
                    tracing::warn!("Generation failed, answering with the error: {}", e);
                    (format!("{}{}", GENERATION_ERROR_PREFIX, e), true)
                }
            },
        };

        tracing::info!(
            "Generated response ({} chars) from {} documents",
            response.len(),
            hits.len()
        );

        Ok(RagResponse {
            query: query.to_string(),
            response,
            retrieved_documents: hits
                .into_iter()
                .map(|(doc, distance)| RetrievedDocument::from_hit(doc, distance))
                .collect(),
            generation_failed,
        })
    }

    /// Persist the index into `dir`. Returns the recorded save time.
    pub async fn save(&self, dir: &Path) -> AppResult<DateTime<Utc>> {
        self.index.read().await.save(dir)
    }

    /// Replace the index with the one saved in `dir`.
    pub async fn load(&self, dir: &Path) -> AppResult<LoadedIndex> {
        self.index.write().await.load(dir)
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    /// Empty the index ahead of a full rebuild.
    pub async fn clear(&self) {
        self.index.write().await.clear();
        tracing::info!("Cleared index");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::HashingProvider;
    use async_trait::async_trait;
    use ragkit_llm::{LlmResponse, LlmUsage};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapLoader(HashMap<String, String>);

    #[async_trait]
    impl DocumentLoader for MapLoader {
        async fn load(&self, source: &str) -> AppResult<Vec<String>> {
            self.0
                .get(source)
                .cloned()
                .map(|text| vec![text])
                .ok_or_else(|| AppError::Knowledge(format!("unknown source {}", source)))
        }

        fn content_type(&self, _source: &str) -> Option<&'static str> {
            Some("text")
        }
    }

    #[derive(Default)]
    struct RecordingLlm {
        prompts: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: "answer".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(1, 1),
            })
        }
    }

    fn pipeline(sources: &[(&str, &str)], llm: Arc<dyn LlmClient>) -> RagPipeline {
        let loader = MapLoader(
            sources
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        let options = RagOptions {
            chunk_size: 40,
            chunk_overlap: 5,
            ..Default::default()
        };
        RagPipeline::new(
            Arc::new(HashingProvider::new(32)),
            llm,
            Arc::new(loader),
            PromptDefinition::default_rag(),
            options,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_chunking() {
        let options = RagOptions {
            chunk_size: 10,
            chunk_overlap: 10,
            ..Default::default()
        };
        let result = RagPipeline::new(
            Arc::new(HashingProvider::new(8)),
            Arc::new(RecordingLlm::default()),
            Arc::new(MapLoader(HashMap::new())),
            PromptDefinition::default_rag(),
            options,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_ingest_numbers_chunks_per_source() {
        let pipeline = pipeline(
            &[
                ("one", "alpha beta gamma delta epsilon zeta eta theta iota kappa"),
                ("two", "short"),
            ],
            Arc::new(RecordingLlm::default()),
        );

        let stats = pipeline
            .ingest(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();

        assert_eq!(stats.sources_count, 2);
        assert_eq!(stats.chunks_count, 3);

        let index = pipeline.index.read().await;
        let labels: Vec<(String, usize)> = index
            .documents()
            .iter()
            .map(|d| (d.metadata.source.clone(), d.metadata.chunk_index))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("one".to_string(), 0),
                ("one".to_string(), 1),
                ("two".to_string(), 0)
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_source_commits_nothing() {
        let pipeline = pipeline(&[("one", "some text")], Arc::new(RecordingLlm::default()));

        let result = pipeline
            .ingest(&["one".to_string(), "missing".to_string()])
            .await;

        assert!(result.is_err());
        assert_eq!(pipeline.stats().await.documents_count, 0);
    }

    #[tokio::test]
    async fn test_empty_ingest() {
        let pipeline = pipeline(&[], Arc::new(RecordingLlm::default()));
        let stats = pipeline.ingest(&[]).await.unwrap();
        assert_eq!(stats.sources_count, 0);
        assert_eq!(stats.chunks_count, 0);
    }

    #[derive(Debug)]
    struct NanEmbedder;

    #[async_trait]
    impl EmbeddingProvider for NanEmbedder {
        fn provider_name(&self) -> &str {
            "nan"
        }

        fn model_name(&self) -> &str {
            "nan-v1"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![f32::NAN; 4]).collect())
        }
    }

    #[tokio::test]
    async fn test_non_finite_query_is_embedding_unavailable() {
        let pipeline = RagPipeline::new(
            Arc::new(NanEmbedder),
            Arc::new(RecordingLlm::default()),
            Arc::new(MapLoader(HashMap::new())),
            PromptDefinition::default_rag(),
            RagOptions::default(),
        )
        .unwrap();

        let err = pipeline.retrieve("anything", 1).await.unwrap_err();
        assert!(matches!(err, AppError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_retrieve_rejects_zero_k() {
        let pipeline = pipeline(&[], Arc::new(RecordingLlm::default()));
        assert!(matches!(
            pipeline.retrieve("anything", 0).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_sends_grounded_prompt() {
        let llm = Arc::new(RecordingLlm::default());
        let pipeline = pipeline(&[("one", "ownership rules in rust")], llm.clone());
        pipeline.ingest(&["one".to_string()]).await.unwrap();

        let response = pipeline.generate("what are the rules?", 3).await.unwrap();
        assert_eq!(response.response, "answer");
        assert_eq!(response.retrieved_documents.len(), 1);

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0]
            .prompt
            .contains("[Document 1]\nownership rules in rust\n"));
        assert!(prompts[0].prompt.contains("Question: what are the rules?."));
        assert_eq!(prompts[0].max_tokens, Some(2000));
        assert_eq!(prompts[0].model, "llama3.2");
    }
}
