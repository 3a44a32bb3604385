//! CLI parse: clap types for corpusgen. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// corpusgen - resilient batch generation of sentence corpora
#[derive(Parser)]
#[command(name = "corpusgen")]
#[command(about = "Generate a sentence corpus in batches from a text-generation service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config files and relative paths resolve against it)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (used when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate sentences and append them to the output file
    Generate {
        /// Total number of sentences to request
        #[arg(long)]
        count: Option<usize>,
        /// Sentences requested per batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Output file (truncated at start)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the cache annotation on first attempts
        #[arg(long)]
        no_cache: bool,
        /// Maximum batches in flight
        #[arg(long)]
        concurrency: Option<usize>,
        /// Skip the usage probe after the run
        #[arg(long)]
        no_usage: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Issue only the usage probe and print token accounting
    Usage {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// List the active topic catalog
    Topics {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
