//! Prompt builder for rendering grounded prompts.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use ragkit_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build the grounded prompt for a question and its retrieved context.
///
/// # Arguments
/// * `definition` - Prompt definition (built in or loaded from YAML)
/// * `question` - The user's question, verbatim
/// * `context` - The labeled context block assembled from retrieved documents
///
/// # Example
/// ```
/// use ragkit_prompt::{build_prompt, PromptDefinition};
///
/// let def = PromptDefinition::default_rag();
/// let built = build_prompt(&def, "What is RAG?", "[Document 1]\nRAG grounds answers.\n").unwrap();
/// assert!(built.user.contains("What is RAG?"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("question".to_string(), question.to_string());
    variables.insert("context".to_string(), context.to_string());

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        source_prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_default_prompt_embeds_context_and_question() {
        let def = PromptDefinition::default_rag();
        let context = "[Document 1]\nRust has no garbage collector.\n";
        let built = build_prompt(&def, "Does Rust use a GC?", context).unwrap();

        assert!(built.user.starts_with("You are a helpful assistant"));
        assert!(built.user.contains("Context: [Document 1]\nRust has no garbage collector.\n."));
        assert!(built.user.contains("Question: Does Rust use a GC?."));
        assert!(built.user.ends_with("Answer:"));
        assert_eq!(built.source_prompt_id, "rag.answer.default");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_no_html_escaping() {
        let def = PromptDefinition::default_rag();
        let built = build_prompt(&def, "is a < b && b > c?", "x").unwrap();
        assert!(built.user.contains("is a < b && b > c?"));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let vars = HashMap::new();
        let result = render_template("{{#if}}", &vars);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
