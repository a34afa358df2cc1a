//! RAG request options and result types.

use crate::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::document::{Document, DocumentMetadata};
use ragkit_llm::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};

/// Default number of documents retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Default number of sources prepared concurrently during ingest.
pub const DEFAULT_INGEST_CONCURRENCY: usize = 4;

/// Generation model used when none is configured.
pub const DEFAULT_GENERATION_MODEL: &str = "llama3.2";

/// Prefix of the answer text when generation fails under `Degrade`.
pub const GENERATION_ERROR_PREFIX: &str = "Error generating response: ";

/// What `generate` does when the generation backend fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationFailurePolicy {
    /// Return the backend error to the caller.
    #[default]
    Propagate,
    /// Answer with the error text and set `generation_failed`.
    Degrade,
}

/// Tunables for one `RagPipeline`.
#[derive(Debug, Clone, PartialEq)]
pub struct RagOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embedding_batch_size: usize,
    pub ingest_concurrency: usize,
    /// Generation model identifier
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub generation_failure_policy: GenerationFailurePolicy,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            embedding_batch_size: 64,
            ingest_concurrency: DEFAULT_INGEST_CONCURRENCY,
            model: DEFAULT_GENERATION_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            generation_failure_policy: GenerationFailurePolicy::default(),
        }
    }
}

/// Outcome of one `ingest` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    pub sources_count: usize,
    pub chunks_count: usize,
    pub bytes_processed: usize,
    pub duration_secs: f64,
}

/// A retrieved document as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Squared L2 distance to the query; lower is closer
    pub similarity_score: f32,
}

impl RetrievedDocument {
    pub fn from_hit(document: Document, distance: f32) -> Self {
        Self {
            content: document.content,
            metadata: document.metadata,
            similarity_score: distance,
        }
    }
}

/// Answer to a question, with the documents it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    pub query: String,
    pub response: String,
    pub retrieved_documents: Vec<RetrievedDocument>,
    /// Set when generation failed and `response` carries the error text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generation_failed: bool,
}
