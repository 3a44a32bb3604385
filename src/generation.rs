//! Batch generation pipeline: planning, per-batch execution and the run loop.

pub mod executor;
pub mod plan;
pub mod run;

pub use executor::{AttemptResult, AttemptState, BatchExecutor, BatchReport, RetryPolicy};
pub use plan::{BatchOutcome, BatchPlan, BatchSpec, RunState, RunSummary};
pub use run::BatchPlanner;
