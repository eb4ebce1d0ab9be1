//! Extraction batch reporting.

use std::time::Duration;

/// Outcome of one successful extraction batch.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of files written.
    pub files_extracted: usize,

    /// Number of directory entries created or reused.
    pub directories_created: usize,

    /// Total content bytes written to disk.
    pub bytes_written: u64,

    /// Number of entries left untouched by a collision rule.
    pub files_skipped: usize,

    /// Archive paths of the skipped entries, in processing order.
    pub skipped: Vec<String>,

    /// Wall time of the batch.
    pub duration: Duration,

    /// Non-fatal notes (skips, superseded duplicates).
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Records an entry skipped because of an existing destination.
    pub fn record_skip(&mut self, path: &str, why: &str) {
        self.files_skipped += 1;
        self.skipped.push(path.to_string());
        self.warnings.push(format!("skipped {path}: {why}"));
    }

    /// Entries written to disk, files and directories.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
