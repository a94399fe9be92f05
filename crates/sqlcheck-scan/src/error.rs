//! Scan error types

use std::path::PathBuf;

/// Errors raised while walking a tree or extracting segments
///
/// Only [`ScanError::RootNotFound`] and [`ScanError::Walk`] end a scan;
/// the per-file variants are reported and the scan moves on.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot extract from {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("source root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("worker processing {} panicked", path.display())]
    WorkerPanicked { path: PathBuf },

    #[error("walker task failed: {0}")]
    Join(String),

    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ScanError {
    /// Whether the error only affects a single file
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            ScanError::FileSystem { .. } | ScanError::Extraction { .. } | ScanError::WorkerPanicked { .. }
        )
    }

    /// File the error relates to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ScanError::FileSystem { path, .. }
            | ScanError::Extraction { path, .. }
            | ScanError::WorkerPanicked { path }
            | ScanError::RootNotFound(path) => Some(path.as_path()),
            ScanError::Walk(err) => err.path(),
            ScanError::Join(_) | ScanError::Pattern(_) => None,
        }
    }
}
