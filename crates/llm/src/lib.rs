//! Generation provider crate for ragkit.
//!
//! Provides a provider-agnostic abstraction over text generation models.
//! The RAG orchestrator receives an `Arc<dyn LlmClient>` at construction time
//! and never reaches for a process-wide client.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//!
//! # Example
//! ```no_run
//! use ragkit_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new()?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    LlmClient, LlmRequest, LlmResponse, LlmUsage, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use factory::create_client;
pub use providers::OllamaClient;
