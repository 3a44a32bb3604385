//! Error types for the corpus generation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Output storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid output path: {0}")]
    InvalidPath(PathBuf),

    #[error("Output I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Classification of a failed request, as seen by the batch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The service rejected the request shape (4xx validation). Triggers the uncached fallback.
    MalformedRequest,
    /// Connection, timeout, authentication, rate limit or server-side failure.
    TransportError,
    /// Anything else, e.g. an undecodable response body.
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::MalformedRequest => "malformed_request",
            FailureKind::TransportError => "transport_error",
            FailureKind::Unexpected => "unexpected",
        };
        f.write_str(label)
    }
}

/// Errors raised by a generation client for a single request
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Request rejected as malformed (status {status}): {message}")]
    MalformedRequest { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected provider error: {0}")]
    Unexpected(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::MalformedRequest { .. } => FailureKind::MalformedRequest,
            ProviderError::Transport(_) => FailureKind::TransportError,
            ProviderError::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

/// Crate-level errors surfaced to the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid batch plan: {0}")]
    InvalidPlan(String),

    #[error("Prompt catalog error: {0}")]
    PromptError(String),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    /// The run finished early because the output stopped accepting writes.
    #[error("Output write failed after {accepted} of {requested} sentences: {error}")]
    OutputInterrupted {
        accepted: usize,
        requested: usize,
        error: String,
        summary: String,
    },
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
