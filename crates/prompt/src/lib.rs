//! Prompt system for ragkit.
//!
//! Grounded prompts are Handlebars templates with two variables,
//! `context` and `question`. A built-in default ships with the crate and a
//! workspace can override it with a YAML definition in `.ragkit/prompts/`.

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{load_prompt, load_rag_prompt};
pub use types::{BuiltPrompt, PromptDefinition, DEFAULT_RAG_PROMPT_ID, DEFAULT_RAG_TEMPLATE};
