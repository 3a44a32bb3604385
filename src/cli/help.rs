//! CLI command-name contract for logging and progress.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "generate", "usage").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { .. } => "generate",
        Commands::Usage { .. } => "usage",
        Commands::Topics { .. } => "topics",
        Commands::Config => "config",
    }
}
