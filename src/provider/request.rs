//! Request payloads for the responses endpoint.
//!
//! The cached and uncached payloads differ only by the `cache_control` annotation on the
//! instruction content part. The uncached payload never serializes the field at all, so the
//! fallback attempt cannot hit the rejection that the annotation caused.

use crate::prompt::PromptCatalog;
use crate::provider::MessageRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One generation request for a batch. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    pub batch_index: usize,
    pub target_count: usize,
    pub caching_enabled: bool,
}

impl GenerationRequest {
    pub fn new(batch_index: usize, target_count: usize, caching_enabled: bool) -> Self {
        Self {
            batch_index,
            target_count,
            caching_enabled,
        }
    }
}

/// Cache hint placed on the instruction content part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub kind: String,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            kind: "ephemeral".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl InputContent {
    fn text(text: String) -> Self {
        Self {
            kind: "input_text".to_string(),
            text,
            cache_control: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: MessageRole,
    pub content: Vec<InputContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    pub format: TextFormat,
    pub verbosity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningOptions {
    pub effort: String,
}

/// Body of a `POST /responses` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesPayload {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub text: TextOptions,
    pub reasoning: ReasoningOptions,
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
}

impl ResponsesPayload {
    /// Whether any input part carries a cache annotation.
    pub fn is_cached(&self) -> bool {
        self.input
            .iter()
            .flat_map(|m| m.content.iter())
            .any(|c| c.cache_control.is_some())
    }

    /// Text of the instruction message, if present.
    pub fn instructions(&self) -> Option<&str> {
        self.input
            .iter()
            .find(|m| m.role == MessageRole::System)
            .and_then(|m| m.content.first())
            .map(|c| c.text.as_str())
    }
}

/// Builds payloads for generation and usage requests
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    model: String,
    verbosity: String,
    reasoning_effort: String,
    catalog: Arc<PromptCatalog>,
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>, catalog: Arc<PromptCatalog>) -> Self {
        Self {
            model: model.into(),
            verbosity: "medium".to_string(),
            reasoning_effort: "minimal".to_string(),
            catalog,
        }
    }

    pub fn with_verbosity(mut self, verbosity: impl Into<String>) -> Self {
        self.verbosity = verbosity.into();
        self
    }

    pub fn with_reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.reasoning_effort = effort.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build(&self, request: &GenerationRequest) -> ResponsesPayload {
        let mut instruction = InputContent::text(
            self.catalog
                .instructions(request.batch_index, request.target_count),
        );
        if request.caching_enabled {
            instruction.cache_control = Some(CacheControl::ephemeral());
        }

        ResponsesPayload {
            model: self.model.clone(),
            input: vec![
                InputMessage {
                    role: MessageRole::System,
                    content: vec![instruction],
                },
                InputMessage {
                    role: MessageRole::User,
                    content: vec![InputContent::text(PromptCatalog::user_hint(
                        request.target_count,
                    ))],
                },
            ],
            text: TextOptions {
                format: TextFormat {
                    kind: "text".to_string(),
                },
                verbosity: self.verbosity.clone(),
            },
            reasoning: ReasoningOptions {
                effort: self.reasoning_effort.clone(),
            },
            tools: Vec::new(),
        }
    }
}
