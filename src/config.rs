//! Configuration System
//!
//! Layered configuration for generation runs: built-in defaults, a user-level file, workspace
//! files and `CORPUSGEN__*` environment overrides. The credential itself never lives in a
//! config file; settings only name the environment variable that holds it.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::{HttpTimeouts, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use crate::prompt::PromptSettings;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Environment variable overriding the configured model.
pub const MODEL_OVERRIDE_ENV: &str = "OPENAI_MODEL";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Text generation service settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Batch planning and output settings
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Prompt catalog settings
    #[serde(default)]
    pub prompt: PromptSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Text generation service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_verbosity")]
    pub verbosity: String,

    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Extra attempts after a transport error, per batch. The cache fallback is separate.
    #[serde(default)]
    pub max_transport_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_model() -> String {
    "gpt-5".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_verbosity() -> String {
    "medium".to_string()
}

fn default_reasoning_effort() -> String {
    "minimal".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            verbosity: default_verbosity(),
            reasoning_effort: default_reasoning_effort(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_transport_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ProviderSettings {
    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String, ApiError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ApiError::MissingCredential(self.api_key_env.clone())),
        }
    }

    /// Configured model, unless `OPENAI_MODEL` names another one.
    pub fn resolve_model(&self) -> String {
        std::env::var(MODEL_OVERRIDE_ENV)
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.model.clone())
    }

    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }
        if self.api_key_env.trim().is_empty() {
            return Err("api_key_env cannot be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Batch planning and output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_total_count")]
    pub total_count: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Send the cache annotation on first attempts
    #[serde(default = "default_true")]
    pub prompt_caching: bool,

    /// Maximum batches in flight; output order is kept regardless
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Issue the usage probe after the run
    #[serde(default = "default_true")]
    pub report_usage: bool,

    /// Lines shown in the summary preview
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

fn default_total_count() -> usize {
    100
}

fn default_batch_size() -> usize {
    10
}

fn default_output_file() -> PathBuf {
    PathBuf::from("sentences.txt")
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    1
}

fn default_preview_lines() -> usize {
    5
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            total_count: default_total_count(),
            batch_size: default_batch_size(),
            output_file: default_output_file(),
            prompt_caching: default_true(),
            concurrency: default_concurrency(),
            report_usage: default_true(),
            preview_lines: default_preview_lines(),
        }
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.total_count == 0 {
            return Err("total_count must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.output_file.as_os_str().is_empty() {
            return Err("output_file cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Generation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CorpusConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all errors into one `ApiError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
