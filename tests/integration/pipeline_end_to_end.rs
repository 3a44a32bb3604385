//! End-to-end runs of the generation pipeline through `RunContext`

use corpusgen::cli::RunContext;
use corpusgen::config::{CorpusConfig, GenerationSettings};
use corpusgen::error::{ApiError, ProviderError};
use corpusgen::progress::{MemoryObserver, ProgressRuntime};
use corpusgen::provider::{HttpTimeouts, OpenAIResponsesClient};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::test_utils::{malformed, numbered_lines, spawn_http_stub};
use crate::integration::ScriptedClient;

fn settings(total_count: usize, batch_size: usize) -> GenerationSettings {
    GenerationSettings {
        total_count,
        batch_size,
        output_file: "out/sentences.txt".into(),
        report_usage: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn failed_middle_batch_yields_shortfall_and_ordered_file() {
    let temp = TempDir::new().unwrap();
    let context = RunContext::with_config(temp.path().to_path_buf(), CorpusConfig::default());
    let batch1 = numbered_lines("alpha", 10);
    let batch3 = numbered_lines("gamma", 5);
    let client = ScriptedClient::new(vec![
        Ok(json!({ "output_text": batch1.join("\n") })),
        Err(ProviderError::Transport("Request timeout".to_string())),
        Ok(json!({ "output_text": batch3.join("\n") })),
    ]);
    let memory = Arc::new(MemoryObserver::new());
    let progress = Arc::new(ProgressRuntime::new("run-e2e").with_observer(memory.clone()));

    let summary = context
        .generate_with_client(&client, &settings(25, 10), Some(progress))
        .await
        .unwrap();

    assert_eq!(summary.requested, 25);
    assert_eq!(summary.accepted, 15);
    assert_eq!(summary.shortfall(), 10);
    assert_eq!(summary.batches_planned, 3);
    assert_eq!(summary.batches_succeeded, 2);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.preview.len(), 5);
    assert_eq!(summary.preview[0], "alpha 0");

    assert_eq!(
        client.hints(),
        vec!["Write 10 sentences.", "Write 10 sentences.", "Write 5 sentences."]
    );

    let written = std::fs::read_to_string(temp.path().join("out/sentences.txt")).unwrap();
    let expected: Vec<String> = batch1.into_iter().chain(batch3).collect();
    assert_eq!(written, format!("{}\n", expected.join("\n")));

    let types = memory.event_types();
    assert_eq!(types.first().map(String::as_str), Some("run_started"));
    assert_eq!(types.last().map(String::as_str), Some("run_completed"));
    assert_eq!(types.iter().filter(|t| *t == "batch_failed").count(), 1);
}

#[tokio::test]
async fn rejected_cache_hint_falls_back_for_every_batch() {
    let temp = TempDir::new().unwrap();
    let context = RunContext::with_config(temp.path().to_path_buf(), CorpusConfig::default());
    let client = ScriptedClient::new(vec![
        Err(malformed()),
        Ok(json!({ "output_text": "a\nb" })),
        Err(malformed()),
        Ok(json!({ "output": [{"type": "message", "content": [{"type": "output_text", "text": "c"}]}] })),
    ]);

    let summary = context
        .generate_with_client(&client, &settings(3, 2), None)
        .await
        .unwrap();

    assert!(summary.is_exact());
    let cached: Vec<bool> = client.payloads().iter().map(|p| p.is_cached()).collect();
    assert_eq!(cached, vec![true, false, true, false]);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("out/sentences.txt")).unwrap(),
        "a\nb\nc\n"
    );
}

#[tokio::test]
async fn usage_probe_follows_generation() {
    let temp = TempDir::new().unwrap();
    let context = RunContext::with_config(temp.path().to_path_buf(), CorpusConfig::default());
    let client = ScriptedClient::new(vec![
        Ok(json!({ "output_text": "only line" })),
        Ok(json!({ "output_text": "probe", "usage": {"input_tokens": 640, "output_tokens": 12, "total_tokens": 652} })),
    ]);
    let generation = GenerationSettings {
        report_usage: true,
        ..settings(1, 10)
    };

    let summary = context
        .generate_with_client(&client, &generation, None)
        .await
        .unwrap();

    let usage = summary.usage.unwrap();
    assert_eq!(usage.prompt_tokens, Some(640));
    assert_eq!(usage.completion_tokens, Some(12));
    assert_eq!(usage.total_tokens, Some(652));
    assert_eq!(client.hints(), vec!["Write 1 sentence.", "Write 1 sentence."]);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("out/sentences.txt")).unwrap(),
        "only line\n"
    );
}

#[tokio::test]
async fn all_batches_failing_still_completes() {
    let temp = TempDir::new().unwrap();
    let context = RunContext::with_config(temp.path().to_path_buf(), CorpusConfig::default());
    let client = ScriptedClient::new(vec![
        Err(ProviderError::Transport("Rate limit exceeded".to_string())),
        Err(ProviderError::Unexpected("Failed to decode response".to_string())),
    ]);

    let summary = context
        .generate_with_client(&client, &settings(4, 2), None)
        .await
        .unwrap();

    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.batches_failed, 2);
    assert!(summary.preview.is_empty());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("out/sentences.txt")).unwrap(),
        ""
    );
}

#[tokio::test]
async fn output_that_is_a_directory_is_fatal() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("taken")).unwrap();
    let context = RunContext::with_config(temp.path().to_path_buf(), CorpusConfig::default());
    let client = ScriptedClient::new(Vec::new());
    let generation = GenerationSettings {
        output_file: "taken".into(),
        ..settings(2, 2)
    };

    let result = context.generate_with_client(&client, &generation, None).await;

    assert!(matches!(result, Err(ApiError::StorageError(_))));
    assert!(client.payloads().is_empty());
}

#[tokio::test]
async fn http_client_recovers_from_rejected_cache_hint() {
    let temp = TempDir::new().unwrap();
    let (base_url, server) = spawn_http_stub(vec![
        (
            400,
            r#"{"error": {"message": "Unknown parameter: cache_control", "type": "invalid_request_error"}}"#.to_string(),
        ),
        (
            200,
            r#"{"output": [{"type": "reasoning", "summary": []}, {"type": "message", "content": [{"type": "output_text", "text": "first\nsecond"}]}]}"#.to_string(),
        ),
    ]);
    let client = OpenAIResponsesClient::new(
        "gpt-5".to_string(),
        "test-key".to_string(),
        Some(base_url),
        HttpTimeouts::default(),
    )
    .unwrap();
    let context = RunContext::with_config(temp.path().to_path_buf(), CorpusConfig::default());

    let summary = context
        .generate_with_client(&client, &settings(2, 2), None)
        .await
        .unwrap();

    assert!(summary.is_exact());
    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 2);
    let first = requests[0].json();
    let second = requests[1].json();
    assert_eq!(
        first["input"][0]["content"][0]["cache_control"]["type"],
        "ephemeral"
    );
    assert!(second["input"][0]["content"][0]
        .get("cache_control")
        .is_none());
    assert_eq!(second["model"], "gpt-5");
    assert_eq!(second["text"]["format"]["type"], "text");
    assert_eq!(second["tools"], json!([]));
    assert_eq!(
        std::fs::read_to_string(temp.path().join("out/sentences.txt")).unwrap(),
        "first\nsecond\n"
    );
}
