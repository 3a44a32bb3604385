//! Integration tests for the corpusgen generation pipeline

mod config_integration;
mod http_client;
mod output_sink;
mod pipeline_end_to_end;
mod planner_properties;
pub mod test_utils;

pub use test_utils::{with_isolated_home, ScriptedClient};
