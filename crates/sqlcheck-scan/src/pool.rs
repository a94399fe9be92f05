//! Bounded worker pool
//!
//! Pulls paths off a channel and runs a processor on each with at most N
//! concurrent executions. Every dispatched path yields exactly one
//! [`ScanResult`]; a failing or panicking processor becomes an error
//! result instead of stopping the pool.

use sqlcheck_core::SqlSegment;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ScanError;

/// Per-file processing function, run on the blocking pool
pub type Processor = Arc<dyn Fn(&Path) -> Result<Vec<SqlSegment>, ScanError> + Send + Sync>;

/// Outcome of processing one path
#[derive(Debug)]
pub struct ScanResult {
    pub path: PathBuf,
    pub outcome: Result<Vec<SqlSegment>, ScanError>,
}

/// A running pool
///
/// `results` closes once every dispatched path has produced its result.
/// `task` resolves to the number of paths dispatched.
pub struct PoolHandle {
    pub results: mpsc::Receiver<ScanResult>,
    pub task: JoinHandle<usize>,
}

/// Worker pool configuration
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    concurrency: usize,
    result_buffer: usize,
}

impl WorkerPool {
    /// Pool running up to `concurrency` processors at once (at least one)
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            concurrency,
            result_buffer: concurrency * 2,
        }
    }

    /// Start consuming `paths`
    ///
    /// After `cancel` fires no new path is dispatched; work already running
    /// finishes and reports. Must be called from within a tokio runtime.
    pub fn run(
        &self,
        mut paths: mpsc::Receiver<PathBuf>,
        processor: Processor,
        cancel: CancellationToken,
    ) -> PoolHandle {
        let (tx, rx) = mpsc::channel(self.result_buffer);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let task = tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            let mut dispatched = 0;

            loop {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    permit = semaphore.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let path = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    path = paths.recv() => match path {
                        Some(path) => path,
                        None => break,
                    },
                };

                while in_flight.try_join_next().is_some() {}

                let processor = processor.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let _permit = permit;
                    let outcome = process(processor, path.clone()).await;
                    // Receiver dropped means the caller stopped listening
                    let _ = tx.send(ScanResult { path, outcome }).await;
                });
                dispatched += 1;
            }

            // Unblocks a producer waiting on a full channel
            drop(paths);

            while in_flight.join_next().await.is_some() {}

            debug!(dispatched, cancelled = cancel.is_cancelled(), "worker pool drained");
            dispatched
        });

        PoolHandle { results: rx, task }
    }
}

async fn process(processor: Processor, path: PathBuf) -> Result<Vec<SqlSegment>, ScanError> {
    let blocking_path = path.clone();
    match tokio::task::spawn_blocking(move || processor(&blocking_path)).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "processor panicked");
            Err(ScanError::WorkerPanicked { path })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlcheck_core::Location;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn feed(count: usize) -> mpsc::Receiver<PathBuf> {
        let (tx, rx) = mpsc::channel(count.max(1));
        for i in 0..count {
            tx.try_send(PathBuf::from(format!("file{}.go", i))).unwrap();
        }
        rx
    }

    fn one_segment() -> Processor {
        Arc::new(|path: &Path| -> Result<Vec<SqlSegment>, ScanError> {
            Ok(vec![SqlSegment::new("SELECT 1", Location::new(path, 1), "go")])
        })
    }

    async fn collect(mut handle: PoolHandle) -> (Vec<ScanResult>, usize) {
        let mut results = Vec::new();
        while let Some(result) = handle.results.recv().await {
            results.push(result);
        }
        (results, handle.task.await.unwrap())
    }

    #[tokio::test]
    async fn one_result_per_path_for_any_concurrency() {
        for concurrency in [0, 1, 3, 64] {
            let handle = WorkerPool::new(concurrency).run(feed(25), one_segment(), CancellationToken::new());
            let (results, dispatched) = collect(handle).await;

            assert_eq!(results.len(), 25, "concurrency {}", concurrency);
            assert_eq!(dispatched, 25);
            assert!(results.iter().all(|r| r.outcome.is_ok()));
        }
    }

    #[tokio::test]
    async fn errors_and_panics_do_not_stop_the_pool() {
        let processor: Processor = Arc::new(|path: &Path| -> Result<Vec<SqlSegment>, ScanError> {
            let name = path.to_string_lossy();
            if name.ends_with("3.go") {
                panic!("boom");
            }
            if name.ends_with("5.go") {
                return Err(ScanError::Extraction {
                    path: path.to_path_buf(),
                    reason: "bad".into(),
                });
            }
            Ok(Vec::new())
        });

        let handle = WorkerPool::new(4).run(feed(10), processor, CancellationToken::new());
        let (results, _) = collect(handle).await;

        assert_eq!(results.len(), 10);
        let panicked = results
            .iter()
            .filter(|r| matches!(r.outcome, Err(ScanError::WorkerPanicked { .. })))
            .count();
        let failed = results
            .iter()
            .filter(|r| matches!(r.outcome, Err(ScanError::Extraction { .. })))
            .count();
        assert_eq!(panicked, 1);
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn never_exceeds_concurrency() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let processor: Processor = {
            let running = running.clone();
            let peak = peak.clone();
            Arc::new(move |_path: &Path| -> Result<Vec<SqlSegment>, ScanError> {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
        };

        let handle = WorkerPool::new(2).run(feed(12), processor, CancellationToken::new());
        let (results, _) = collect(handle).await;

        assert_eq!(results.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn cancelled_pool_dispatches_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let handle = WorkerPool::new(4).run(feed(10), one_segment(), cancel);
        let (results, dispatched) = collect(handle).await;

        assert!(results.is_empty());
        assert_eq!(dispatched, 0);
    }

    #[tokio::test]
    async fn empty_input() {
        let handle = WorkerPool::new(4).run(feed(0), one_segment(), CancellationToken::new());
        let (results, dispatched) = collect(handle).await;
        assert!(results.is_empty());
        assert_eq!(dispatched, 0);
    }
}
