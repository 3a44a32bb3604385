//! CLI domain: parse, route, help, output, and presentation only.
//! No pipeline logic; a single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_section_heading, format_summary_json, format_summary_text, format_topics_json,
    format_topics_text, format_usage_json, format_usage_text,
};
pub use route::{GenerateOverrides, RunContext};
