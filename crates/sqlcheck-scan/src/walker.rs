//! Source tree walking
//!
//! The walk runs on the blocking pool and hands paths to async consumers
//! through a bounded channel, so a slow consumer throttles the walk.

use sqlcheck_core::Config;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;
use crate::pattern::{is_hidden, ExcludeSet};

/// What to walk and what to skip
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory to walk
    pub root: PathBuf,

    /// Accepted extensions, lower-cased without the dot
    pub extensions: Vec<String>,

    /// Names pruned from the walk
    pub exclude: ExcludeSet,

    /// Capacity of the path channel
    pub buffer: usize,
}

impl WalkOptions {
    /// Walk `root` with the default filters
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&Config {
            source_root: root.into(),
            ..Config::default()
        })
    }

    /// Options from the run configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.source_root.clone(),
            extensions: config.normalized_extensions(),
            exclude: ExcludeSet::new(&config.exclude),
            buffer: config.path_buffer.max(1),
        }
    }

    /// Replace the accepted extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Replace the exclude patterns
    pub fn with_exclude(mut self, exclude: ExcludeSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// Whether the entry and everything below it is skipped
    fn is_pruned(&self, entry: &DirEntry) -> bool {
        // The root is walked even if its own name looks hidden or excluded
        if entry.depth() == 0 {
            return false;
        }

        let name = entry.file_name().to_string_lossy();
        is_hidden(&name) || self.exclude.is_excluded(&name)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// A running walk
///
/// `paths` closes when the walk finishes, fails or is cancelled. `task`
/// resolves to the number of paths emitted, or the first walk error.
pub struct WalkHandle {
    pub paths: mpsc::Receiver<PathBuf>,
    pub task: JoinHandle<Result<usize, ScanError>>,
}

/// Start walking `options.root`
///
/// Fails immediately with [`ScanError::RootNotFound`] if the root does not
/// exist. Must be called from within a tokio runtime.
pub fn walk(options: WalkOptions, cancel: CancellationToken) -> Result<WalkHandle, ScanError> {
    let root = std::fs::canonicalize(&options.root)
        .map_err(|_| ScanError::RootNotFound(options.root.clone()))?;

    let (tx, rx) = mpsc::channel(options.buffer);

    let task = tokio::task::spawn_blocking(move || {
        let mut emitted = 0;
        let entries = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|entry| !options.is_pruned(entry));

        for entry in entries {
            if cancel.is_cancelled() {
                debug!(emitted, "walk cancelled");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "walk failed");
                    return Err(ScanError::Walk(err));
                }
            };

            if !entry.file_type().is_file() || !options.accepts(entry.path()) {
                continue;
            }

            // Receiver gone means nobody wants more paths
            if tx.blocking_send(entry.into_path()).is_err() {
                debug!(emitted, "path receiver closed");
                break;
            }
            emitted += 1;
        }

        debug!(root = %root.display(), emitted, "walk finished");
        Ok(emitted)
    });

    Ok(WalkHandle { paths: rx, task })
}
