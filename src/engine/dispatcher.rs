// src/engine/dispatcher.rs

//! Per-path serialization of conversion jobs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::pipeline::{ConversionJob, ConversionPipeline, ConversionResult};

/// Book-keeping for a source path that has a job in flight.
#[derive(Default)]
struct PathSlot {
    /// Latest job submitted while the current one was running.
    pending: Option<ConversionJob>,
}

struct Shared {
    accepting: AtomicBool,
    slots: Mutex<HashMap<PathBuf, PathSlot>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Runs jobs on background tasks, never more than one per source path.
///
/// - A job for a path that is already being converted is parked; if several
///   arrive, only the latest is kept. It runs once the current job finishes.
/// - Across different paths, at most `workers` conversions run at once.
/// - [`close`](Self::close) stops accepting work and drops parked jobs;
///   [`drain`](Self::drain) waits for the jobs already started.
pub struct JobDispatcher {
    pipeline: Arc<ConversionPipeline>,
    permits: Arc<Semaphore>,
    shared: Arc<Shared>,
    results: Option<mpsc::UnboundedSender<ConversionResult>>,
}

impl std::fmt::Debug for JobDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDispatcher")
            .field("in_flight", &self.in_flight())
            .field("accepting", &self.is_accepting())
            .finish_non_exhaustive()
    }
}

impl JobDispatcher {
    pub fn new(pipeline: Arc<ConversionPipeline>, workers: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            shared: Arc::new(Shared {
                accepting: AtomicBool::new(true),
                slots: Mutex::new(HashMap::new()),
                handles: Mutex::new(Vec::new()),
            }),
            results: None,
        }
    }

    /// Forward every job result to `tx`.
    pub fn with_results(mut self, tx: mpsc::UnboundedSender<ConversionResult>) -> Self {
        self.results = Some(tx);
        self
    }

    /// Submit a job. Returns false if the dispatcher has been closed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, job: ConversionJob) -> bool {
        if !self.is_accepting() {
            debug!(source = ?job.source_path, "dispatcher closed; dropping job");
            return false;
        }

        {
            let mut slots = lock(&self.shared.slots);
            if let Some(slot) = slots.get_mut(&job.source_path) {
                debug!(
                    source = ?job.source_path,
                    "job already in flight for path; parking latest request"
                );
                slot.pending = Some(job);
                return true;
            }
            slots.insert(job.source_path.clone(), PathSlot::default());
        }

        let handle = tokio::spawn(run_path(
            job,
            Arc::clone(&self.pipeline),
            Arc::clone(&self.permits),
            Arc::clone(&self.shared),
            self.results.clone(),
        ));

        let mut handles = lock(&self.shared.handles);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        true
    }

    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::SeqCst)
    }

    /// Number of source paths with a job running or parked.
    pub fn in_flight(&self) -> usize {
        lock(&self.shared.slots).len()
    }

    /// Stop accepting jobs and discard parked ones. Running jobs continue.
    pub fn close(&self) {
        self.shared.accepting.store(false, Ordering::SeqCst);
        let mut slots = lock(&self.shared.slots);
        let dropped = slots.values_mut().filter_map(|s| s.pending.take()).count();
        if dropped > 0 {
            debug!(dropped, "discarded parked jobs on close");
        }
    }

    /// Wait until every job started so far has finished.
    pub async fn drain(&self) {
        loop {
            let handles = std::mem::take(&mut *lock(&self.shared.handles));
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "conversion worker panicked or was cancelled");
                }
            }
        }
    }
}

/// Releases a path's slot if its worker unwinds mid-job, so later
/// submissions for that path start a fresh worker instead of parking forever.
struct SlotGuard {
    shared: Arc<Shared>,
    path: PathBuf,
    armed: bool,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let slot = lock(&self.shared.slots).remove(&self.path);
        let dropped_parked = slot.is_some_and(|s| s.pending.is_some());
        warn!(
            source = ?self.path,
            dropped_parked,
            "conversion worker aborted; releasing path"
        );
    }
}

/// Worker for one source path: runs the job, then any job parked for the
/// same path meanwhile, until none is left.
async fn run_path(
    mut job: ConversionJob,
    pipeline: Arc<ConversionPipeline>,
    permits: Arc<Semaphore>,
    shared: Arc<Shared>,
    results: Option<mpsc::UnboundedSender<ConversionResult>>,
) {
    let mut guard = SlotGuard {
        shared: Arc::clone(&shared),
        path: job.source_path.clone(),
        armed: true,
    };

    loop {
        let result = match permits.acquire().await {
            Ok(_permit) => pipeline.process(&job).await,
            Err(_) => {
                lock(&shared.slots).remove(&job.source_path);
                guard.armed = false;
                return;
            }
        };

        if let Some(tx) = &results {
            let _ = tx.send(result);
        }

        // Taking the parked job and releasing the slot happen under one lock
        // so a concurrent `submit` either parks into this slot or starts a
        // fresh worker, never both.
        let mut slots = lock(&shared.slots);
        let next = if shared.accepting.load(Ordering::SeqCst) {
            slots
                .get_mut(&job.source_path)
                .and_then(|slot| slot.pending.take())
        } else {
            None
        };

        match next {
            Some(next_job) => {
                debug!(source = ?next_job.source_path, "running parked job for path");
                job = next_job;
            }
            None => {
                slots.remove(&job.source_path);
                guard.armed = false;
                return;
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
