//! Batch executor: runs one batch through the cached → uncached attempt sequence.
//! Owns request attempts and their progress events; the planner owns outcomes and output.

use crate::config::{GenerationSettings, ProviderSettings};
use crate::error::{FailureKind, ProviderError};
use crate::generation::plan::{BatchOutcome, BatchSpec};
use crate::progress::{ProgressRuntime, ATTEMPT_RETRY, ATTEMPT_STARTED, CACHE_FALLBACK};
use crate::provider::{
    ExtractedText, GenerationClient, GenerationRequest, RawResponse, RequestBuilder,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Attempt state of a single batch.
///
/// `Cached` may move to `Uncached` once, on a malformed-request rejection. `Uncached` has
/// no successor, so a batch never falls back twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Cached,
    Uncached,
}

impl AttemptState {
    pub fn initial(prompt_caching: bool) -> Self {
        if prompt_caching {
            AttemptState::Cached
        } else {
            AttemptState::Uncached
        }
    }

    pub fn caching_enabled(self) -> bool {
        matches!(self, AttemptState::Cached)
    }

    /// Next state after a failed attempt, or `None` when the failure ends the batch.
    pub fn on_failure(self, error: &ProviderError) -> Option<Self> {
        match (self, error.kind()) {
            (AttemptState::Cached, FailureKind::MalformedRequest) => Some(AttemptState::Uncached),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AttemptState::Cached => "cached",
            AttemptState::Uncached => "uncached",
        }
    }
}

/// Knobs of the attempt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub prompt_caching: bool,
    /// Extra attempts allowed after a transport error, per batch
    pub max_transport_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            prompt_caching: true,
            max_transport_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(provider: &ProviderSettings, generation: &GenerationSettings) -> Self {
        Self {
            prompt_caching: generation.prompt_caching,
            max_transport_retries: provider.max_transport_retries,
            retry_backoff: Duration::from_millis(provider.retry_backoff_ms),
        }
    }
}

/// Final response (or error) of an attempt sequence and how many requests it took
#[derive(Debug)]
pub struct AttemptResult {
    pub result: Result<RawResponse, ProviderError>,
    pub attempts: usize,
}

/// What happened to one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch: BatchSpec,
    pub outcome: BatchOutcome,
    pub attempts: usize,
    pub error: Option<String>,
}

/// Executes batches against a generation client
pub struct BatchExecutor {
    builder: RequestBuilder,
    policy: RetryPolicy,
    progress: Option<Arc<ProgressRuntime>>,
}

impl BatchExecutor {
    pub fn new(builder: RequestBuilder, policy: RetryPolicy) -> Self {
        Self {
            builder,
            policy,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<Arc<ProgressRuntime>>) -> Self {
        self.progress = progress;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run the attempt sequence for one request of `count` sentences.
    pub async fn request<C: GenerationClient + ?Sized>(
        &self,
        client: &C,
        batch_index: usize,
        count: usize,
    ) -> AttemptResult {
        let mut state = AttemptState::initial(self.policy.prompt_caching);
        let mut attempts = 0usize;
        let mut transport_retries = 0u32;

        loop {
            attempts += 1;
            let request = GenerationRequest::new(batch_index, count, state.caching_enabled());
            let payload = self.builder.build(&request);
            debug!(
                batch_index,
                attempt = attempts,
                mode = state.label(),
                target_count = count,
                "Sending generation request"
            );
            self.emit_event(
                ATTEMPT_STARTED,
                json!({
                    "batch_index": batch_index,
                    "attempt": attempts,
                    "mode": state.label(),
                    "target_count": count,
                }),
            );

            let error = match client.create_response(&payload).await {
                Ok(raw) => {
                    return AttemptResult {
                        result: Ok(raw),
                        attempts,
                    }
                }
                Err(error) => error,
            };

            if let Some(next) = state.on_failure(&error) {
                warn!(
                    batch_index,
                    error = %error,
                    "Cached request rejected, retrying without cache hint"
                );
                self.emit_event(
                    CACHE_FALLBACK,
                    json!({
                        "batch_index": batch_index,
                        "attempt": attempts,
                        "error": error.to_string(),
                    }),
                );
                state = next;
                continue;
            }

            if error.kind() == FailureKind::TransportError
                && transport_retries < self.policy.max_transport_retries
            {
                transport_retries += 1;
                warn!(
                    batch_index,
                    retry = transport_retries,
                    max_retries = self.policy.max_transport_retries,
                    error = %error,
                    "Transport error, retrying"
                );
                self.emit_event(
                    ATTEMPT_RETRY,
                    json!({
                        "batch_index": batch_index,
                        "attempt": attempts,
                        "retry": transport_retries,
                        "error": error.to_string(),
                    }),
                );
                sleep(self.policy.retry_backoff).await;
                continue;
            }

            return AttemptResult {
                result: Err(error),
                attempts,
            };
        }
    }

    /// Execute one batch and classify its outcome.
    pub async fn execute<C: GenerationClient + ?Sized>(
        &self,
        client: &C,
        batch: BatchSpec,
    ) -> BatchReport {
        let AttemptResult { result, attempts } =
            self.request(client, batch.index, batch.target_count).await;

        match result {
            Ok(raw) => {
                let extracted = ExtractedText::from_response(&raw);
                if extracted.is_empty() {
                    warn!(batch_index = batch.index, attempts, "Batch produced no text");
                    BatchReport {
                        batch,
                        outcome: BatchOutcome::EmptyResult,
                        attempts,
                        error: None,
                    }
                } else {
                    info!(
                        batch_index = batch.index,
                        attempts,
                        lines = extracted.len(),
                        requested = batch.target_count,
                        "Batch generated"
                    );
                    BatchReport {
                        batch,
                        outcome: BatchOutcome::Success(extracted.into_lines()),
                        attempts,
                        error: None,
                    }
                }
            }
            Err(error) => {
                warn!(
                    batch_index = batch.index,
                    attempts,
                    kind = %error.kind(),
                    error = %error,
                    "Batch failed"
                );
                BatchReport {
                    batch,
                    outcome: BatchOutcome::Failed(error.kind()),
                    attempts,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    fn emit_event(&self, event_type: &str, data: serde_json::Value) {
        if let Some(progress) = &self.progress {
            progress.emit_event_best_effort(event_type, data);
        }
    }
}
