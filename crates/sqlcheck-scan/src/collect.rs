//! Walker -> pool -> flat segment list

use sqlcheck_core::{Config, SqlSegment};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ScanError;
use crate::extractor::ExtractorRegistry;
use crate::pool::{Processor, WorkerPool};
use crate::walker::{walk, WalkOptions};

/// Everything a scan produced
#[derive(Debug, Default)]
pub struct CollectedSegments {
    /// Segments from every file, unordered across files
    pub segments: Vec<SqlSegment>,

    /// Files that produced a result (success or failure)
    pub files_scanned: usize,

    /// Per-file failures and a walk error, if one ended the walk early
    pub failures: Vec<ScanError>,

    /// Whether the scan stopped because of cancellation
    pub cancelled: bool,
}

/// Scans a source tree for SQL segments
#[derive(Debug, Clone)]
pub struct Scanner {
    walk: WalkOptions,
    pool: WorkerPool,
    registry: Arc<ExtractorRegistry>,
}

impl Scanner {
    pub fn new(walk: WalkOptions, pool: WorkerPool, registry: ExtractorRegistry) -> Self {
        Self {
            walk,
            pool,
            registry: Arc::new(registry),
        }
    }

    /// Scanner using the regex extractor for every file
    pub fn from_config(config: &Config) -> Result<Self, ScanError> {
        Ok(Self::new(
            WalkOptions::from_config(config),
            WorkerPool::new(config.workers),
            ExtractorRegistry::new(config.max_file_bytes)?,
        ))
    }

    /// Walk, extract and flatten
    ///
    /// A missing root fails the scan. Per-file errors and a walk error are
    /// collected in [`CollectedSegments::failures`] and the scan keeps
    /// whatever it gathered.
    pub async fn collect(&self, cancel: CancellationToken) -> Result<CollectedSegments, ScanError> {
        let walk_handle = walk(self.walk.clone(), cancel.clone())?;

        let registry = self.registry.clone();
        let processor: Processor = Arc::new(move |path: &Path| registry.extract_file(path));
        let mut pool = self.pool.run(walk_handle.paths, processor, cancel.clone());

        let mut collected = CollectedSegments::default();
        while let Some(result) = pool.results.recv().await {
            collected.files_scanned += 1;
            match result.outcome {
                Ok(segments) => collected.segments.extend(segments),
                Err(error) => {
                    warn!(path = %result.path.display(), error = %error, "skipping file");
                    collected.failures.push(error);
                }
            }
        }

        pool.task
            .await
            .map_err(|e| ScanError::Join(e.to_string()))?;

        match walk_handle.task.await {
            Ok(Ok(_)) => {}
            Ok(Err(error)) => collected.failures.push(error),
            Err(e) => return Err(ScanError::Join(e.to_string())),
        }

        collected.cancelled = cancel.is_cancelled();

        info!(
            files = collected.files_scanned,
            segments = collected.segments.len(),
            failures = collected.failures.len(),
            cancelled = collected.cancelled,
            "scan finished"
        );

        Ok(collected)
    }
}
