use crate::error::{ApiError, FailureKind};
use crate::usage::UsageReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One planned batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSpec {
    pub index: usize,
    pub target_count: usize,
}

/// Division of a total sentence count into fixed-size batches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchPlan {
    pub total_count: usize,
    pub batch_size: usize,
    pub total_batches: usize,
}

impl BatchPlan {
    pub fn new(total_count: usize, batch_size: usize) -> Result<Self, ApiError> {
        if total_count == 0 {
            return Err(ApiError::InvalidPlan(
                "Total count must be at least 1".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(ApiError::InvalidPlan(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            total_count,
            batch_size,
            total_batches: total_count.div_ceil(batch_size),
        })
    }

    /// Sentences to request for a batch, given how many earlier batches already requested.
    /// `None` once nothing remains.
    pub fn batch_target(&self, requested_so_far: usize) -> Option<usize> {
        let remaining = self.total_count.checked_sub(requested_so_far)?;
        if remaining == 0 {
            return None;
        }
        Some(remaining.min(self.batch_size))
    }

    /// Batches in order. Stops early if the remainder runs out before `total_batches`.
    pub fn batches(&self) -> Vec<BatchSpec> {
        let mut specs = Vec::with_capacity(self.total_batches);
        let mut requested = 0usize;
        for index in 0..self.total_batches {
            let Some(target_count) = self.batch_target(requested) else {
                break;
            };
            requested += target_count;
            specs.push(BatchSpec {
                index,
                target_count,
            });
        }
        specs
    }
}

/// Result of one batch, consumed by the planner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Success(Vec<String>),
    EmptyResult,
    Failed(FailureKind),
}

impl BatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            BatchOutcome::Success(_) => "success",
            BatchOutcome::EmptyResult => "empty",
            BatchOutcome::Failed(_) => "failed",
        }
    }
}

/// Lines accepted so far in one run. Owned by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    total_lines: Vec<String>,
    batches_completed: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, lines: &[String]) {
        self.total_lines.extend_from_slice(lines);
    }

    pub fn complete_batch(&mut self) {
        self.batches_completed += 1;
    }

    pub fn total_lines(&self) -> &[String] {
        &self.total_lines
    }

    pub fn accepted_count(&self) -> usize {
        self.total_lines.len()
    }

    pub fn batches_completed(&self) -> usize {
        self.batches_completed
    }

    pub fn preview(&self, limit: usize) -> Vec<String> {
        self.total_lines.iter().take(limit).cloned().collect()
    }
}

/// Final report of a generation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub requested: usize,
    pub accepted: usize,
    pub batches_planned: usize,
    pub batches_succeeded: usize,
    pub batches_empty: usize,
    pub batches_failed: usize,
    pub output: PathBuf,
    pub preview: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageReport>,
    /// Set when writing to the output stopped the run early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_error: Option<String>,
}

impl RunSummary {
    /// Accepted minus requested. Negative means shortfall.
    pub fn discrepancy(&self) -> i64 {
        self.accepted as i64 - self.requested as i64
    }

    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.accepted)
    }

    pub fn is_exact(&self) -> bool {
        self.accepted == self.requested
    }
}
