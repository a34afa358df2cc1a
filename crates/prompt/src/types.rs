//! Prompt types for ragkit.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in grounded answering prompt.
pub const DEFAULT_RAG_PROMPT_ID: &str = "rag.answer.default";

/// Built-in grounded answering template.
///
/// Variables: `context` (the labeled document block) and `question`.
pub const DEFAULT_RAG_TEMPLATE: &str = "You are a helpful assistant answering questions based on the provided context. \
Context: {{context}}. \
Question: {{question}}. \
Please provide a comprehensive answer based on the context above. \
If the context doesn't contain enough information to fully answer the question, acknowledge this limitation. \
Answer:";

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Optional system message sent alongside the rendered template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    /// The built-in grounded answering prompt.
    pub fn default_rag() -> Self {
        Self {
            id: DEFAULT_RAG_PROMPT_ID.to_string(),
            title: "Grounded answer".to_string(),
            api_version: "1.0".to_string(),
            created_by: "ragkit".to_string(),
            system: None,
            template: DEFAULT_RAG_TEMPLATE.to_string(),
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,
}
