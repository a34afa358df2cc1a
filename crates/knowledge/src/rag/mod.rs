//! RAG (Retrieval-Augmented Generation) orchestration.
//!
//! Ingests sources into a vector index and answers questions by retrieving
//! the closest chunks and handing them to a generation provider.

pub mod context;
pub mod pipeline;
pub mod types;

pub use context::{build_context, truncate_snippet};
pub use pipeline::RagPipeline;
pub use types::{
    GenerationFailurePolicy, IngestStats, RagOptions, RagResponse, RetrievedDocument,
};
