//! Error types for pluvio-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the pluvio-io crate.
///
/// `file` fields name the file (or caller-supplied label) being parsed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file or directory does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an operating-system read failure.
    #[error("failed to read {}: {reason}", path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when the metadata header is missing or truncated.
    #[error("invalid header in {file}: {reason}")]
    Header {
        /// File being parsed.
        file: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the daily table has no header row or no data rows.
    #[error("invalid table in {file}: {reason}")]
    Table {
        /// File being parsed.
        file: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },
}

impl IoError {
    pub(crate) fn read(path: impl Into<PathBuf>, e: &std::io::Error) -> Self {
        IoError::Read {
            path: path.into(),
            reason: e.to_string(),
        }
    }
}
