//! Batch planner: drives a plan through the executor and folds outcomes into run state.
//!
//! Batches may be in flight concurrently, but reports are consumed strictly in batch order,
//! so the sink and `RunState` always see lines in plan order. Only this loop touches either.

use crate::error::StorageError;
use crate::generation::executor::{BatchExecutor, BatchReport};
use crate::generation::plan::{BatchOutcome, BatchPlan, RunState, RunSummary};
use crate::progress::{
    now_millis, ProgressRuntime, BATCH_EMPTY, BATCH_FAILED, BATCH_STARTED, BATCH_SUCCEEDED,
    OUTPUT_FAILED, RUN_COMPLETED, RUN_STARTED,
};
use crate::provider::GenerationClient;
use crate::sink::OutputSink;
use crate::usage::UsageReporter;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct BatchPlanner {
    executor: BatchExecutor,
    concurrency: usize,
    preview_lines: usize,
    usage: Option<UsageReporter>,
    progress: Option<Arc<ProgressRuntime>>,
}

#[derive(Debug, Default)]
struct OutcomeCounts {
    succeeded: usize,
    empty: usize,
    failed: usize,
}

impl BatchPlanner {
    const DEFAULT_PREVIEW_LINES: usize = 5;

    pub fn new(executor: BatchExecutor) -> Self {
        Self {
            executor,
            concurrency: 1,
            preview_lines: Self::DEFAULT_PREVIEW_LINES,
            usage: None,
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_preview_lines(mut self, preview_lines: usize) -> Self {
        self.preview_lines = preview_lines;
        self
    }

    pub fn with_usage_reporter(mut self, reporter: Option<UsageReporter>) -> Self {
        self.usage = reporter;
        self
    }

    pub fn with_progress(mut self, progress: Option<Arc<ProgressRuntime>>) -> Self {
        self.progress = progress;
        self
    }

    pub fn executor(&self) -> &BatchExecutor {
        &self.executor
    }

    /// Run every batch of `plan`, appending accepted lines to `sink`.
    ///
    /// Batch-level failures never abort the run. A failing sink stops further batches, but
    /// usage is still requested and the summary carries the write error.
    pub async fn run<C: GenerationClient + ?Sized>(
        &self,
        client: &C,
        plan: &BatchPlan,
        sink: &mut OutputSink,
    ) -> (RunState, RunSummary) {
        let batches = plan.batches();
        let run_id = self
            .progress
            .as_ref()
            .map(|p| p.run_id().to_string())
            .unwrap_or_else(|| format!("run-{}", now_millis()));

        info!(
            run_id = %run_id,
            total_count = plan.total_count,
            batch_size = plan.batch_size,
            batches = batches.len(),
            concurrency = self.concurrency,
            output = %sink.path().display(),
            "Generation started"
        );
        self.emit_event(
            RUN_STARTED,
            json!({
                "total_count": plan.total_count,
                "batch_size": plan.batch_size,
                "batches_planned": batches.len(),
                "concurrency": self.concurrency,
                "output": sink.path(),
            }),
        );

        let mut state = RunState::new();
        let mut counts = OutcomeCounts::default();
        let executor = &self.executor;

        let mut reports = stream::iter(batches.iter().copied().map(move |batch| {
            self.emit_event(
                BATCH_STARTED,
                json!({"batch_index": batch.index, "target_count": batch.target_count}),
            );
            executor.execute(client, batch)
        }))
        .buffered(self.concurrency);

        let mut output_error = None;
        while let Some(report) = reports.next().await {
            if let Err(err) = self.fold_report(&report, &mut state, &mut counts, sink) {
                error!(
                    batch_index = report.batch.index,
                    written = sink.lines_written(),
                    error = %err,
                    "Output write failed, stopping run"
                );
                self.emit_event(
                    OUTPUT_FAILED,
                    json!({
                        "batch_index": report.batch.index,
                        "lines_written": sink.lines_written(),
                        "error": err.to_string(),
                    }),
                );
                output_error = Some(err.to_string());
                break;
            }
        }
        drop(reports);

        let summary = RunSummary {
            run_id,
            requested: plan.total_count,
            accepted: state.accepted_count(),
            batches_planned: batches.len(),
            batches_succeeded: counts.succeeded,
            batches_empty: counts.empty,
            batches_failed: counts.failed,
            output: sink.path().to_path_buf(),
            preview: state.preview(self.preview_lines),
            usage: None,
            output_error,
        };
        self.report_discrepancy(&summary);

        let usage = match &self.usage {
            Some(reporter) => reporter.report(&self.executor, client).await,
            None => None,
        };
        let summary = RunSummary { usage, ..summary };

        info!(
            requested = summary.requested,
            accepted = summary.accepted,
            succeeded = summary.batches_succeeded,
            empty = summary.batches_empty,
            failed = summary.batches_failed,
            "Generation completed"
        );
        self.emit_event(
            RUN_COMPLETED,
            json!({
                "requested": summary.requested,
                "accepted": summary.accepted,
                "batches_completed": state.batches_completed(),
                "batches_succeeded": summary.batches_succeeded,
                "batches_empty": summary.batches_empty,
                "batches_failed": summary.batches_failed,
                "output_error": summary.output_error,
            }),
        );

        (state, summary)
    }

    fn fold_report(
        &self,
        report: &BatchReport,
        state: &mut RunState,
        counts: &mut OutcomeCounts,
        sink: &mut OutputSink,
    ) -> Result<(), StorageError> {
        let batch_index = report.batch.index;
        match &report.outcome {
            BatchOutcome::Success(lines) => {
                let before = sink.lines_written();
                if let Err(err) = sink.append_batch(lines) {
                    // Lines already on disk stay counted.
                    let written = sink.lines_written() - before;
                    state.accept(&lines[..written]);
                    return Err(err);
                }
                state.accept(lines);
                counts.succeeded += 1;
                self.emit_event(
                    BATCH_SUCCEEDED,
                    json!({
                        "batch_index": batch_index,
                        "attempts": report.attempts,
                        "lines": lines.len(),
                        "target_count": report.batch.target_count,
                        "total_lines": state.accepted_count(),
                    }),
                );
            }
            BatchOutcome::EmptyResult => {
                counts.empty += 1;
                warn!(batch_index, "No sentences extracted, continuing");
                self.emit_event(
                    BATCH_EMPTY,
                    json!({"batch_index": batch_index, "attempts": report.attempts}),
                );
            }
            BatchOutcome::Failed(kind) => {
                counts.failed += 1;
                warn!(batch_index, kind = %kind, "Batch skipped, continuing");
                self.emit_event(
                    BATCH_FAILED,
                    json!({
                        "batch_index": batch_index,
                        "attempts": report.attempts,
                        "error_kind": kind,
                        "error": report.error,
                    }),
                );
            }
        }
        state.complete_batch();
        Ok(())
    }

    fn report_discrepancy(&self, summary: &RunSummary) {
        if summary.is_exact() {
            return;
        }
        if summary.shortfall() > 0 {
            warn!(
                requested = summary.requested,
                accepted = summary.accepted,
                shortfall = summary.shortfall(),
                preview = ?summary.preview,
                "Generated fewer sentences than requested"
            );
        } else {
            warn!(
                requested = summary.requested,
                accepted = summary.accepted,
                surplus = summary.discrepancy(),
                preview = ?summary.preview,
                "Generated more sentences than requested"
            );
        }
    }

    fn emit_event(&self, event_type: &str, data: serde_json::Value) {
        if let Some(progress) = &self.progress {
            progress.emit_event_best_effort(event_type, data);
        }
    }
}
