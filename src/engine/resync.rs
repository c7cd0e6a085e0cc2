// src/engine/resync.rs

//! One-shot bulk conversion of a whole watch tree.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::pipeline::{
    ConversionJob, ConversionPipeline, ConversionResult, JobFailure, JobOrigin, JobOutcome,
    SessionRoots,
};
use crate::scan::TreeScanner;

/// Summary of a resync run.
#[derive(Debug, Default)]
pub struct ResyncReport {
    /// Mirrored paths, in completion order.
    pub mirrored: Vec<PathBuf>,
    pub skipped: usize,
    pub failures: Vec<JobFailure>,
}

impl ResyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files processed, whatever the outcome.
    pub fn total(&self) -> usize {
        self.mirrored.len() + self.skipped + self.failures.len()
    }

    fn record(&mut self, joined: Result<ConversionResult, JoinError>) {
        match joined {
            Ok(Ok(JobOutcome::Mirrored(paths))) => self.mirrored.push(paths.mirrored),
            Ok(Ok(JobOutcome::Skipped(_))) => self.skipped += 1,
            Ok(Err(failure)) => self.failures.push(failure),
            Err(e) => warn!(error = %e, "resync worker panicked or was cancelled"),
        }
    }
}

/// Convert and mirror every recognized file under the watch root.
///
/// The tree is enumerated once on the blocking pool; each discovered file
/// becomes one job, with at most `workers` jobs running at a time. A failed
/// file is recorded in the report and does not stop the run.
///
/// Running this concurrently with a live watcher on the same roots is not
/// guarded against.
pub async fn resync(
    pipeline: Arc<ConversionPipeline>,
    scanner: &TreeScanner,
    roots: Arc<SessionRoots>,
    workers: usize,
) -> ResyncReport {
    info!(
        watch_root = ?roots.watch_root(),
        mirror_root = ?roots.mirror_root(),
        workers,
        "starting resync"
    );

    let (path_tx, mut path_rx) = mpsc::channel::<PathBuf>(64);
    let walker = {
        let scanner = scanner.clone();
        let root = roots.watch_root().to_path_buf();
        tokio::task::spawn_blocking(move || {
            for path in scanner.scan(&root) {
                if path_tx.blocking_send(path).is_err() {
                    return;
                }
            }
        })
    };

    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let registry = Arc::clone(pipeline.registry());
    let mut jobs = JoinSet::new();
    let mut report = ResyncReport::default();

    while let Some(path) = path_rx.recv().await {
        let Some(job) = ConversionJob::classify(&registry, &path, &roots, JobOrigin::Resync)
        else {
            continue;
        };

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };

        debug!(source = ?job.source_path, "queued resync job");
        let pipeline = Arc::clone(&pipeline);
        jobs.spawn(async move {
            let _permit = permit;
            pipeline.process(&job).await
        });

        while let Some(joined) = jobs.try_join_next() {
            report.record(joined);
        }
    }

    while let Some(joined) = jobs.join_next().await {
        report.record(joined);
    }

    if let Err(e) = walker.await {
        warn!(error = %e, "resync scan task failed");
    }

    info!(
        mirrored = report.mirrored.len(),
        skipped = report.skipped,
        failed = report.failures.len(),
        "resync finished"
    );

    report
}
