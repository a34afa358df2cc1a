//! Exact nearest-neighbour index over document embeddings.
//!
//! Vectors live in one flat row-major buffer parallel to the document list:
//! row `i` is the embedding of `documents[i]`. Search is a linear scan with
//! squared Euclidean distance, so results are exact and cost O(n * d) per
//! query.

use crate::document::Document;
use ragkit_core::{AppError, AppResult};
use serde::Serialize;
use std::collections::BTreeSet;

/// Document count beyond which a linear scan stops being interactive.
///
/// Crossing it only logs a warning; the index keeps working.
pub const BRUTE_FORCE_SOFT_LIMIT: usize = 100_000;

/// Summary of an index's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub dimension: usize,
    pub documents_count: usize,
    pub sources_count: usize,
}

/// Append-only flat vector index.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    pub(crate) dimension: usize,
    pub(crate) documents: Vec<Document>,
    pub(crate) vectors: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of width `dimension`.
    pub fn new(dimension: usize) -> AppResult<Self> {
        if dimension == 0 {
            return Err(AppError::Config(
                "Index dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            documents: Vec::new(),
            vectors: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Stored documents in insertion order. Embeddings are held by the index.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.vectors.get(start..end)
    }

    /// Append documents, each carrying an embedding of exactly `dimension`.
    ///
    /// All-or-nothing: every document is checked before any is stored, and
    /// the first offender's position in `documents` is reported.
    pub fn add(&mut self, documents: Vec<Document>) -> AppResult<()> {
        for (index, doc) in documents.iter().enumerate() {
            if let Some(key) = doc.metadata.reserved_extra_key() {
                return Err(AppError::InvalidDocument {
                    index,
                    reason: format!("metadata extension key '{}' is reserved", key),
                });
            }

            match doc.embedding() {
                None => {
                    return Err(AppError::InvalidDocument {
                        index,
                        reason: "missing embedding".to_string(),
                    })
                }
                Some(v) if v.len() != self.dimension => {
                    return Err(AppError::InvalidDocument {
                        index,
                        reason: format!(
                            "embedding has {} dimensions, index expects {}",
                            v.len(),
                            self.dimension
                        ),
                    })
                }
                Some(v) if v.iter().any(|x| !x.is_finite()) => {
                    return Err(AppError::InvalidDocument {
                        index,
                        reason: "embedding contains a non-finite value".to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        let added = documents.len();
        self.vectors.reserve(added * self.dimension);
        self.documents.reserve(added);

        for mut doc in documents {
            if let Some(vector) = doc.take_embedding() {
                self.vectors.extend_from_slice(&vector);
            }
            self.documents.push(doc);
        }

        let total = self.documents.len();
        if total > BRUTE_FORCE_SOFT_LIMIT && total - added <= BRUTE_FORCE_SOFT_LIMIT {
            tracing::warn!(
                "Index holds {} documents, past the brute-force soft limit of {}; searches scan every vector",
                total,
                BRUTE_FORCE_SOFT_LIMIT
            );
        }

        tracing::debug!("Added {} documents (total: {})", added, total);
        Ok(())
    }

    /// The `k` stored documents closest to `query`, nearest first.
    ///
    /// Distances are squared Euclidean. Equal distances keep insertion
    /// order. Fewer than `k` stored documents returns all of them.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(Document, f32)>> {
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }
        if query.len() != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(AppError::InvalidArgument(
                "query vector contains a non-finite value".to_string(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|row| squared_l2(query, row))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| (self.documents[position].clone(), distance))
            .collect())
    }

    pub fn stats(&self) -> IndexStats {
        let sources: BTreeSet<&str> = self
            .documents
            .iter()
            .map(|d| d.metadata.source.as_str())
            .collect();

        IndexStats {
            dimension: self.dimension,
            documents_count: self.documents.len(),
            sources_count: sources.len(),
        }
    }

    /// Drop every document, keeping the dimension.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.vectors.clear();
    }
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
