//! Cross-module scenarios and shared test doubles.

mod end_to_end;

use crate::embeddings::providers::HashingProvider;
use crate::loader::FileLoader;
use crate::rag::{RagOptions, RagPipeline};
use async_trait::async_trait;
use ragkit_core::{AppError, AppResult};
use ragkit_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ragkit_prompt::PromptDefinition;
use std::sync::{Arc, Mutex};

/// Answers every request with a fixed text and remembers the prompts.
pub(crate) struct ScriptedLlm {
    answer: String,
    pub(crate) requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(LlmResponse {
            content: self.answer.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(request.prompt.len() as u32, self.answer.len() as u32),
        })
    }
}

/// Fails every request the way an unreachable backend would.
pub(crate) struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    fn provider_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Llm("connection refused".to_string()))
    }
}

/// Pipeline over local files with 384-dimensional hashing embeddings.
pub(crate) fn file_pipeline(llm: Arc<dyn LlmClient>, options: RagOptions) -> RagPipeline {
    RagPipeline::new(
        Arc::new(HashingProvider::new(384)),
        llm,
        Arc::new(FileLoader::new()),
        PromptDefinition::default_rag(),
        options,
    )
    .unwrap()
}

/// About 2000 characters of prose: three chunks at the default settings.
pub(crate) fn long_text() -> String {
    [
        "Rust guarantees memory safety through ownership and borrowing. ",
        "The borrow checker rejects dangling references at compile time. ",
        "Cargo builds crates and resolves their dependency graph. ",
        "Async runtimes such as tokio drive futures to completion. ",
    ]
    .concat()
    .repeat(10)
    .chars()
    .take(2000)
    .collect()
}
