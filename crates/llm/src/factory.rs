//! Generation provider factory.
//!
//! Resolves a provider name from configuration into a concrete `LlmClient`.

use crate::client::LlmClient;
use crate::providers::ollama::{OllamaClient, DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT_SECS};
use ragkit_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a generation client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout_secs` - Optional request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, and
/// `AppError::Llm` if the client cannot be initialized.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout_secs: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            let client =
                OllamaClient::with_base_url(base_url, timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))?;
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: '{}'. Supported providers: ollama",
            provider
        ))),
    }
}
