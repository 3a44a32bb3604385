//! Progress observability for generation runs.
//!
//! Every pipeline transition becomes a `ProgressEvent` with a run id and a monotonically
//! increasing sequence number. Events fan out to observers on a best-effort basis; an
//! observer never influences the run.

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const RUN_STARTED: &str = "run_started";
pub const BATCH_STARTED: &str = "batch_started";
pub const ATTEMPT_STARTED: &str = "attempt_started";
pub const CACHE_FALLBACK: &str = "cache_fallback";
pub const ATTEMPT_RETRY: &str = "attempt_retry";
pub const BATCH_SUCCEEDED: &str = "batch_succeeded";
pub const BATCH_EMPTY: &str = "batch_empty";
pub const BATCH_FAILED: &str = "batch_failed";
pub const OUTPUT_FAILED: &str = "output_failed";
pub const RUN_COMPLETED: &str = "run_completed";
pub const USAGE_REPORTED: &str = "usage_reported";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub ts: String,
    pub run: String,
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

/// Receives progress events
pub trait ProgressObserver: Send + Sync {
    fn observe(&self, event: &ProgressEvent);
}

/// Stamps events and forwards them to observers
pub struct ProgressRuntime {
    run_id: String,
    seq: AtomicU64,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ProgressRuntime {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            seq: AtomicU64::new(0),
            observers: Vec::new(),
        }
    }

    /// Runtime with a run id derived from the current time.
    pub fn for_new_run() -> Self {
        Self::new(format!("run-{}", now_millis()))
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit_event_best_effort(&self, event_type: &str, data: Value) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ProgressEvent {
            ts: now_millis().to_string(),
            run: self.run_id.clone(),
            seq,
            event_type: event_type.to_string(),
            data,
        };
        for observer in &self.observers {
            observer.observe(&event);
        }
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Forwards events to `tracing` at debug level
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn observe(&self, event: &ProgressEvent) {
        debug!(
            run = %event.run,
            seq = event.seq,
            event_type = %event.event_type,
            data = %event.data,
            "progress"
        );
    }
}

/// Prints one status line per finished batch to stderr
#[derive(Default)]
pub struct TerminalObserver {
    total_batches: AtomicUsize,
    finished: AtomicUsize,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, event: &ProgressEvent) -> Option<String> {
        let batch = event.data.get("batch_index").and_then(Value::as_u64);
        match event.event_type.as_str() {
            RUN_STARTED => {
                let total = event
                    .data
                    .get("batches_planned")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                self.total_batches.store(total as usize, Ordering::SeqCst);
                None
            }
            BATCH_SUCCEEDED | BATCH_EMPTY | BATCH_FAILED => {
                let done = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total_batches.load(Ordering::SeqCst);
                let prefix = format!("[{}/{}]", done, total);
                let index = batch.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string());
                let line = match event.event_type.as_str() {
                    BATCH_SUCCEEDED => {
                        let lines = event.data.get("lines").and_then(Value::as_u64).unwrap_or(0);
                        format!("{} batch {} {} ({} lines)", prefix, index, "ok".green(), lines)
                    }
                    BATCH_EMPTY => format!("{} batch {} {}", prefix, index, "empty".yellow()),
                    _ => {
                        let kind = event
                            .data
                            .get("error_kind")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown");
                        format!("{} batch {} {} ({})", prefix, index, "failed".red(), kind)
                    }
                };
                Some(line)
            }
            OUTPUT_FAILED => Some(format!(
                "batch {} {}",
                batch.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string()),
                "output write failed, stopping".red()
            )),
            CACHE_FALLBACK => Some(format!(
                "batch {} {}",
                batch.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string()),
                "cache hint rejected, retrying without it".yellow()
            )),
            _ => None,
        }
    }
}

impl ProgressObserver for TerminalObserver {
    fn observe(&self, event: &ProgressEvent) {
        if let Some(line) = self.render(event) {
            eprintln!("{}", line);
        }
    }
}

/// Keeps every event in memory, for tests and JSON summaries
#[derive(Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }
}

impl ProgressObserver for MemoryObserver {
    fn observe(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}
