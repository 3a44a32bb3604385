//! Integration tests for the HTTP client's failure classification

use corpusgen::error::{FailureKind, ProviderError};
use corpusgen::prompt::PromptCatalog;
use corpusgen::provider::{
    GenerationClient, GenerationRequest, HttpTimeouts, OpenAIResponsesClient, RequestBuilder,
    ResponsesPayload,
};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::test_utils::spawn_http_stub;

fn payload() -> ResponsesPayload {
    RequestBuilder::new("gpt-5", Arc::new(PromptCatalog::builtin()))
        .build(&GenerationRequest::new(0, 3, true))
}

fn client(base_url: String) -> OpenAIResponsesClient {
    OpenAIResponsesClient::new(
        "gpt-5".to_string(),
        "test-key".to_string(),
        Some(base_url),
        HttpTimeouts {
            connect: Duration::from_secs(2),
            request: Duration::from_secs(5),
        },
    )
    .unwrap()
}

async fn classify(status: u16, body: &str) -> ProviderError {
    let (base_url, server) = spawn_http_stub(vec![(status, body.to_string())]);
    let result = client(base_url).create_response(&payload()).await;
    server.join().unwrap();
    result.unwrap_err()
}

#[tokio::test]
async fn validation_statuses_are_malformed() {
    let err = classify(400, r#"{"error": {"message": "Unsupported parameter"}}"#).await;
    match err {
        ProviderError::MalformedRequest { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Unsupported parameter");
        }
        other => panic!("Wrong classification: {:?}", other),
    }
    assert_eq!(
        classify(422, "{}").await.kind(),
        FailureKind::MalformedRequest
    );
}

#[tokio::test]
async fn auth_and_server_statuses_are_transport() {
    assert_eq!(
        classify(401, r#"{"error": {"message": "Incorrect API key"}}"#)
            .await
            .kind(),
        FailureKind::TransportError
    );
    assert_eq!(
        classify(500, "upstream exploded").await.kind(),
        FailureKind::TransportError
    );
}

#[tokio::test]
async fn undecodable_success_body_is_unexpected() {
    assert_eq!(
        classify(200, "<html>not json</html>").await.kind(),
        FailureKind::Unexpected
    );
}

#[tokio::test]
async fn refused_connection_is_transport() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}/v1", addr))
        .create_response(&payload())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::TransportError);
}

#[tokio::test]
async fn request_carries_bearer_credential_and_payload() {
    let (base_url, server) = spawn_http_stub(vec![(200, r#"{"output_text": "ok"}"#.to_string())]);
    let raw = client(base_url).create_response(&payload()).await.unwrap();
    assert_eq!(raw.body()["output_text"], "ok");

    let requests = server.join().unwrap();
    let request = &requests[0];
    assert!(request.head.starts_with("POST /v1/responses "));
    assert_eq!(request.header("authorization"), Some("Bearer test-key"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));

    let sent = request.json();
    assert_eq!(sent["reasoning"]["effort"], "minimal");
    assert_eq!(sent["text"]["verbosity"], "medium");
    assert_eq!(sent["input"][0]["role"], "system");
    assert_eq!(sent["input"][1]["role"], "user");
}
