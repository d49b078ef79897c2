//! Reader error taxonomy.
//!
//! These errors never leave [`Reader::load`](crate::traits::Reader::load):
//! every variant is logged and turned into an empty result. They exist so the
//! log line says *why* a source produced nothing.

use std::path::PathBuf;
use std::time::Duration;

/// A failure that aborts a whole reader call.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The source file or directory does not exist.
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// No path was supplied and the source has no default location.
    #[error("no source location configured for {0}")]
    NotConfigured(&'static str),

    /// The scratch copy could not be created.
    #[error("failed to snapshot {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening or querying the snapshot database failed.
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The export directory could not be enumerated.
    #[error("failed to enumerate export directory: {0}")]
    Enumerate(#[from] walkdir::Error),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// The copy + query phase ran past its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ReaderError {
    /// Whether this failure is the benign "nothing to read" case.
    pub fn is_missing_source(&self) -> bool {
        matches!(
            self,
            ReaderError::SourceNotFound(_) | ReaderError::NotConfigured(_)
        )
    }
}
