//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::MissingCredential(var) => format!(
            "Error: {} is not set.\nExport your API key first, e.g. `export {}=...`",
            var, var
        ),
        ApiError::StorageError(err) => format!("Error: output is not writable: {}", err),
        ApiError::OutputInterrupted {
            accepted,
            requested,
            error,
            summary,
        } => format!(
            "{}\nError: output is not writable: {} ({} of {} sentences kept)",
            summary, error, accepted, requested
        ),
        other => format!("Error: {}", other),
    }
}
