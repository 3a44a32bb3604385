//! Response decoding and text extraction.
//!
//! The service has returned text in several shapes over time: a flattened `output_text`
//! field, a list of `output` items holding typed content parts, and the older `choices`
//! list. Extraction tries each shape in that order and stops at the first one that yields
//! non-blank text. Each shape is decoded leniently into typed structs; a shape that does not
//! decode simply yields nothing.

use crate::error::ProviderError;
use crate::usage::UsageReport;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Opaque response document returned by the service
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    body: Value,
}

impl RawResponse {
    pub fn from_value(body: Value) -> Self {
        Self { body }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProviderError> {
        serde_json::from_slice(bytes)
            .map(Self::from_value)
            .map_err(|e| ProviderError::Unexpected(format!("Failed to decode response: {}", e)))
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Decode one top-level field into `T`, treating absence or mismatch as `None`.
    fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.body.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!(field = key, error = %e, "Ignoring undecodable response field");
                None
            }
        }
    }

    /// Token accounting, if the service reported a usage object.
    pub fn usage(&self) -> Option<UsageReport> {
        self.field::<RawUsage>("usage").map(RawUsage::into_report)
    }
}

#[derive(Debug, Deserialize)]
struct RawUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl RawUsage {
    fn into_report(self) -> UsageReport {
        UsageReport {
            prompt_tokens: self.prompt_tokens.or(self.input_tokens),
            completion_tokens: self.completion_tokens.or(self.output_tokens),
            total_tokens: self.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Option<Vec<Value>>,
}

/// Content part kinds that carry plain text
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ContentPart {
    fn into_text(self) -> Option<String> {
        match self {
            ContentPart::OutputText { text } | ContentPart::Text { text } => Some(text),
            ContentPart::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyChoice {
    #[serde(default)]
    message: Option<LegacyMessage>,
}

#[derive(Debug, Deserialize)]
struct LegacyMessage {
    #[serde(default)]
    content: Option<LegacyContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyContent {
    Text(String),
    Parts(Vec<Value>),
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn part_text(part: Value) -> Option<String> {
    serde_json::from_value::<ContentPart>(part)
        .ok()
        .and_then(ContentPart::into_text)
}

/// Shape 1: the flattened `output_text` field.
fn flattened_text(raw: &RawResponse) -> Option<String> {
    raw.field::<String>("output_text").and_then(non_blank)
}

/// Shape 2: text parts of every `output` item, newline separated, in encounter order.
fn output_items_text(raw: &RawResponse) -> Option<String> {
    let items = raw.field::<Vec<Value>>("output")?;
    let texts: Vec<String> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<OutputItem>(item).ok())
        .filter_map(|item| item.content)
        .flatten()
        .filter_map(part_text)
        .collect();
    if texts.is_empty() {
        return None;
    }
    non_blank(texts.join("\n"))
}

/// Shape 3: content of the first legacy choice's message.
fn legacy_choice_text(raw: &RawResponse) -> Option<String> {
    let choice = raw
        .field::<Vec<Value>>("choices")?
        .into_iter()
        .next()
        .and_then(|first| serde_json::from_value::<LegacyChoice>(first).ok())?;
    let text = match choice.message?.content? {
        LegacyContent::Text(text) => text,
        LegacyContent::Parts(parts) => parts.into_iter().filter_map(part_text).collect(),
    };
    non_blank(text)
}

/// Best-effort plain text of a response; empty when no shape yields text.
pub fn extract_text(raw: &RawResponse) -> String {
    flattened_text(raw)
        .or_else(|| output_items_text(raw))
        .or_else(|| legacy_choice_text(raw))
        .unwrap_or_default()
}

/// Ordered, non-empty, trimmed lines of generated text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    lines: Vec<String>,
}

impl ExtractedText {
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn from_response(raw: &RawResponse) -> Self {
        Self::from_text(&extract_text(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
