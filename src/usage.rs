//! Usage accounting probe.
//!
//! After a run, one small request (a single sentence) is issued through the same
//! cached → uncached sequence as a batch, and whatever token counts the service returns
//! are reported. Counts the service omits stay absent.

use crate::generation::executor::{AttemptResult, BatchExecutor};
use crate::progress::{ProgressRuntime, USAGE_REPORTED};
use crate::provider::GenerationClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Token counts reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl UsageReport {
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
    }

    /// Present fields as `(label, value)` pairs, in display order.
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        [
            ("prompt_tokens", self.prompt_tokens),
            ("completion_tokens", self.completion_tokens),
            ("total_tokens", self.total_tokens),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }
}

const PROBE_BATCH_INDEX: usize = 0;
const PROBE_TARGET_COUNT: usize = 1;

/// Issues the usage probe
pub struct UsageReporter {
    progress: Option<Arc<ProgressRuntime>>,
}

impl UsageReporter {
    pub fn new(progress: Option<Arc<ProgressRuntime>>) -> Self {
        Self { progress }
    }

    /// Probe the service for usage accounting. A failed probe, or a response without a
    /// usage object, yields `None`.
    pub async fn report<C: GenerationClient + ?Sized>(
        &self,
        executor: &BatchExecutor,
        client: &C,
    ) -> Option<UsageReport> {
        let AttemptResult { result, attempts } = executor
            .request(client, PROBE_BATCH_INDEX, PROBE_TARGET_COUNT)
            .await;

        let usage = match result {
            Ok(raw) => raw.usage().filter(|usage| !usage.is_empty()),
            Err(error) => {
                warn!(attempts, error = %error, "Usage probe failed");
                return None;
            }
        };

        match &usage {
            Some(report) => {
                info!(
                    prompt_tokens = ?report.prompt_tokens,
                    completion_tokens = ?report.completion_tokens,
                    total_tokens = ?report.total_tokens,
                    "Usage reported"
                );
                if let Some(progress) = &self.progress {
                    progress.emit_event_best_effort(
                        USAGE_REPORTED,
                        json!({ "attempts": attempts, "usage": report }),
                    );
                }
            }
            None => warn!("Usage probe returned no usage object"),
        }
        usage
    }
}
