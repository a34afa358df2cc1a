//! The unit of retrieval: text, provenance metadata and an optional vector.

use ragkit_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys owned by `DocumentMetadata` itself; never valid in `extra`.
pub const RESERVED_METADATA_KEYS: [&str; 2] = ["source", "chunk_index"];

/// Provenance metadata attached to every chunk.
///
/// `source` and `chunk_index` are always present. Anything else a loader
/// wants to record goes into `extra`, which is flattened on the wire so the
/// serialized form is a single mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Origin identifier (file path, object key, URL)
    pub source: String,

    /// 0-based ordinal of this chunk within its source
    pub chunk_index: usize,

    /// Open extension bag
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Metadata with only the well-known keys.
    pub fn new(source: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            source: source.into(),
            chunk_index,
            extra: BTreeMap::new(),
        }
    }

    /// Add an extension key.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Look up an extension key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// The first extension key that collides with a well-known field.
    ///
    /// Such a key would serialize as a duplicate field and make the record
    /// unreadable.
    pub fn reserved_extra_key(&self) -> Option<&str> {
        self.extra
            .keys()
            .map(String::as_str)
            .find(|key| RESERVED_METADATA_KEYS.contains(key))
    }
}

/// A chunk of text ready to be embedded and indexed.
///
/// Documents carry no identity of their own: inside a `VectorIndex` a
/// document is identified by its insertion position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
    #[serde(default, skip_serializing)]
    embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
            embedding: None,
        }
    }

    /// Construct a document that already has its vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> AppResult<Self> {
        self.attach_embedding(embedding)?;
        Ok(self)
    }

    /// Attach the embedding. A document's embedding is written once.
    pub fn attach_embedding(&mut self, embedding: Vec<f32>) -> AppResult<()> {
        if self.embedding.is_some() {
            return Err(AppError::Knowledge(format!(
                "Document {}#{} already has an embedding",
                self.metadata.source, self.metadata.chunk_index
            )));
        }
        self.embedding = Some(embedding);
        Ok(())
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Split off the vector, leaving the document without one.
    pub(crate) fn take_embedding(&mut self) -> Option<Vec<f32>> {
        self.embedding.take()
    }
}
