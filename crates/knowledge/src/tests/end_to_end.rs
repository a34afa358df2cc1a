//! Ingest, retrieve and generate against real files.

use super::{file_pipeline, long_text, FailingLlm, ScriptedLlm};
use crate::rag::types::GENERATION_ERROR_PREFIX;
use crate::rag::{GenerationFailurePolicy, RagOptions};
use ragkit_core::AppError;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_single_source_round_trip() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "rust.txt", &long_text());

    let llm = Arc::new(ScriptedLlm::new("Rust uses ownership."));
    let pipeline = file_pipeline(llm.clone(), RagOptions::default());

    let stats = pipeline.ingest(&[source.clone()]).await.unwrap();
    assert_eq!(stats.sources_count, 1);
    assert_eq!(stats.chunks_count, 3);
    assert_eq!(stats.bytes_processed, 2000);
    assert_eq!(pipeline.dimension(), 384);

    let hits = pipeline.retrieve("how does the borrow checker work", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].1 <= hits[1].1);

    let response = pipeline
        .generate("how does the borrow checker work", 2)
        .await
        .unwrap();

    assert_eq!(response.query, "how does the borrow checker work");
    assert_eq!(response.response, "Rust uses ownership.");
    assert!(!response.generation_failed);
    assert_eq!(response.retrieved_documents.len(), 2);
    for (retrieved, (hit, distance)) in response.retrieved_documents.iter().zip(&hits) {
        assert_eq!(retrieved.content, hit.content);
        assert_eq!(retrieved.metadata.source, source);
        assert_eq!(retrieved.similarity_score, *distance);
    }

    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .prompt
        .contains(&format!("[Document 1]\n{}\n", hits[0].0.content)));
    assert!(requests[0]
        .prompt
        .contains(&format!("[Document 2]\n{}\n", hits[1].0.content)));
}

#[tokio::test]
async fn test_search_with_large_k_returns_everything() {
    let temp = TempDir::new().unwrap();
    let a = write_source(&temp, "a.txt", "ownership and borrowing");
    let b = write_source(&temp, "b.md", "# Cargo\n\ncrates and dependencies");

    let pipeline = file_pipeline(Arc::new(ScriptedLlm::new("ok")), RagOptions::default());
    pipeline.ingest(&[a, b]).await.unwrap();

    let hits = pipeline.retrieve("crates", 5).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0.content, "Cargo\ncrates and dependencies");
}

#[tokio::test]
async fn test_exact_match_is_nearest() {
    let temp = TempDir::new().unwrap();
    let a = write_source(&temp, "a.txt", "tokio drives futures to completion");
    let b = write_source(&temp, "b.txt", "the borrow checker rejects dangling references");

    let pipeline = file_pipeline(Arc::new(ScriptedLlm::new("ok")), RagOptions::default());
    pipeline.ingest(&[a, b]).await.unwrap();

    let hits = pipeline
        .retrieve("the borrow checker rejects dangling references", 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].0.metadata.source.ends_with("b.txt"));
    assert!(hits[0].1.abs() < 1e-6);
}

#[tokio::test]
async fn test_unsupported_source_aborts_ingest() {
    let temp = TempDir::new().unwrap();
    let good = write_source(&temp, "good.txt", "fine text");
    let pdf = write_source(&temp, "scan.pdf", "%PDF-1.4");

    let pipeline = file_pipeline(Arc::new(ScriptedLlm::new("ok")), RagOptions::default());
    let err = pipeline.ingest(&[good, pdf]).await.unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(pipeline.stats().await.documents_count, 0);
}

#[tokio::test]
async fn test_generation_failure_propagates_by_default() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "a.txt", "some grounded text");

    let pipeline = file_pipeline(Arc::new(FailingLlm), RagOptions::default());
    pipeline.ingest(&[source]).await.unwrap();

    let err = pipeline.generate("question", 1).await.unwrap_err();
    assert!(matches!(err, AppError::Llm(_)));
}

#[tokio::test]
async fn test_generation_failure_degrades_when_asked() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "a.txt", "some grounded text");

    let options = RagOptions {
        generation_failure_policy: GenerationFailurePolicy::Degrade,
        ..Default::default()
    };
    let pipeline = file_pipeline(Arc::new(FailingLlm), options);
    pipeline.ingest(&[source]).await.unwrap();

    let response = pipeline.generate("question", 1).await.unwrap();
    assert!(response.generation_failed);
    assert!(response.response.starts_with(GENERATION_ERROR_PREFIX));
    assert!(response.response.contains("connection refused"));
    assert_eq!(response.retrieved_documents.len(), 1);
}

#[tokio::test]
async fn test_generate_on_empty_index_still_answers() {
    let llm = Arc::new(ScriptedLlm::new("I don't know."));
    let pipeline = file_pipeline(llm.clone(), RagOptions::default());

    let response = pipeline.generate("anything?", 3).await.unwrap();
    assert!(response.retrieved_documents.is_empty());
    assert_eq!(response.response, "I don't know.");
    assert!(llm.requests.lock().unwrap()[0].prompt.contains("Context: ."));
}
