//! Error types for ragkit.
//!
//! One enum covers every failure class in the pipeline. The variants are
//! grouped the way callers need to react to them:
//! - configuration and usage errors are fatal and never retried,
//! - backend errors come from the embedding or generation services,
//! - data-integrity errors leave the index in its last known-good state.

use thiserror::Error;

/// Unified error type for ragkit.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (bad dimension, chunk overlap, unsupported format)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller passed an argument outside the accepted domain (e.g. `k == 0`)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedding backend could not produce vectors
    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Generation provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// A document in an `add` batch failed validation
    #[error("Invalid document at position {index}: {reason}")]
    InvalidDocument { index: usize, reason: String },

    /// A vector or a persisted store does not match the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted index artifacts are malformed or inconsistent with each other
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Knowledge base errors that do not fit a more specific variant
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from an external model backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, AppError::EmbeddingUnavailable(_) | AppError::Llm(_))
    }

    /// Whether this error reports damaged or mismatched index data.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            AppError::InvalidDocument { .. }
                | AppError::DimensionMismatch { .. }
                | AppError::CorruptIndex(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
