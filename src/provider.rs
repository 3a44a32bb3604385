//! Text Generation Provider
//!
//! Client abstraction over the text-generation service. The pipeline only needs one
//! operation, creating a response from a payload, so the trait is small enough to be
//! replaced by a scripted double in tests. Failures are classified into the three kinds
//! the batch state machine distinguishes.

use crate::config::ProviderSettings;
use crate::error::{ApiError, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod request;
pub mod response;

pub use request::{GenerationRequest, RequestBuilder, ResponsesPayload};
pub use response::{extract_text, ExtractedText, RawResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// Text generation client trait
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Issue one request and return the undecoded response document.
    async fn create_response(&self, payload: &ResponsesPayload)
        -> Result<RawResponse, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Connect and request deadlines for provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(120),
        }
    }
}

fn build_provider_http_client(timeouts: HttpTimeouts) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

// Helper function to map HTTP transport errors to ProviderError
fn map_http_error(error: reqwest::Error) -> ProviderError {
    if let Some(status) = error.status() {
        classify_status(status, error.to_string())
    } else if error.is_timeout() {
        ProviderError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::Transport(format!("Connection error: {}", error))
    } else if error.is_decode() || error.is_body() {
        ProviderError::Unexpected(format!("Failed to read response: {}", error))
    } else {
        ProviderError::Transport(format!("HTTP error: {}", error))
    }
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a non-success status to a failure class.
///
/// 400 and 422 mean the service understood the call but rejected its shape, which is the
/// case the uncached fallback can repair. Everything else is a transport-level failure.
pub fn classify_status(status: StatusCode, body: String) -> ProviderError {
    let message = error_message(&body);
    match status.as_u16() {
        400 | 422 => ProviderError::MalformedRequest {
            status: status.as_u16(),
            message,
        },
        401 | 403 => ProviderError::Transport(format!("Authentication failed: {}", message)),
        429 => ProviderError::Transport(format!("Rate limit exceeded: {}", message)),
        404 => ProviderError::Transport(format!("Model or endpoint not found: {}", message)),
        _ => ProviderError::Transport(format!(
            "Request failed with status {}: {}",
            status, message
        )),
    }
}

/// Client for the OpenAI responses endpoint
pub struct OpenAIResponsesClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAIResponsesClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ApiError> {
        let client = build_provider_http_client(timeouts)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            model,
            api_key,
            base_url,
        })
    }

    /// Build a client from settings, resolving the credential and model override from the
    /// environment. A missing credential fails here, before any batch runs.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ApiError> {
        let api_key = settings.resolve_api_key()?;
        Self::new(
            settings.resolve_model(),
            api_key,
            Some(settings.base_url.clone()),
            settings.timeouts(),
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }
}

#[async_trait]
impl GenerationClient for OpenAIResponsesClient {
    async fn create_response(
        &self,
        payload: &ResponsesPayload,
    ) -> Result<RawResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, error_text));
        }

        let body = response.bytes().await.map_err(map_http_error)?;
        RawResponse::from_slice(&body)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
