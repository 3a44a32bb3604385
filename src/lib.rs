//! corpusgen: Resilient Batch Generation of Sentence Corpora
//!
//! Requests a target number of sentences from a text-generation service in fixed-size
//! batches. Each batch tries a cache-annotated request first and falls back to a plain one
//! when the service rejects the annotation. Text is extracted from whichever response shape
//! comes back, and accepted lines are appended durably to an output file. A failed batch
//! never stops the run; the final count is compared with the target and reported.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod sink;
pub mod usage;
