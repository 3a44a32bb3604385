//! Durable line sink for accepted sentences.
//!
//! The target is truncated once when the sink is created. Each accepted batch is appended
//! line by line, and every line is synced before the next is written, so an interrupted run
//! leaves a valid prefix of its output on disk.

use crate::error::StorageError;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct OutputSink {
    path: PathBuf,
    lines_written: usize,
}

impl OutputSink {
    /// Create (or truncate) the output file, creating parent directories as needed.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if path.as_os_str().is_empty() || path.is_dir() {
            return Err(StorageError::InvalidPath(path));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        file.sync_all()?;
        debug!(path = %path.display(), "Output truncated");

        Ok(Self {
            path,
            lines_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Append one batch of lines. Returns the number of lines written.
    pub fn append_batch(&mut self, lines: &[String]) -> Result<usize, StorageError> {
        if lines.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        for line in lines {
            let mut record = String::with_capacity(line.len() + 1);
            record.push_str(line);
            record.push('\n');
            file.write_all(record.as_bytes())?;
            file.sync_data()?;
            self.lines_written += 1;
        }
        debug!(
            path = %self.path.display(),
            lines = lines.len(),
            total = self.lines_written,
            "Batch appended"
        );
        Ok(lines.len())
    }
}
