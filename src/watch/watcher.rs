// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::JobDispatcher;
use crate::errors::{AssetMirrorError, Result};
use crate::pipeline::{ConversionJob, ConversionPipeline, ConversionResult, JobOrigin, SessionRoots};
use crate::watch::event_handler::{DebounceQueue, EventFilter};
use crate::watch::patterns::ExcludeMatcher;

/// Tuning for a watch session.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period per path before events become a job. Zero dispatches
    /// every qualifying event immediately.
    pub debounce: Duration,
    /// Maximum number of conversions running at once.
    pub workers: usize,
    pub exclude: ExcludeMatcher,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            workers: 4,
            exclude: ExcludeMatcher::default(),
        }
    }
}

impl WatchOptions {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Ok(Self {
            debounce: cfg.watch.debounce(),
            workers: cfg.watch.workers,
            exclude: ExcludeMatcher::new(&cfg.watch.exclude)?,
        })
    }
}

/// Everything owned by a running watch session.
struct ActiveWatch {
    /// Dropping this releases the OS watch.
    watcher: RecommendedWatcher,
    shutdown: oneshot::Sender<()>,
    event_loop: JoinHandle<()>,
    dispatcher: Arc<JobDispatcher>,
    roots: Arc<SessionRoots>,
}

enum WatcherState {
    Stopped,
    Watching(ActiveWatch),
}

/// Live watch session: `Stopped → Watching → Stopped`.
///
/// While watching, `notify` delivers events on its own thread; they are
/// forwarded into an async event loop that filters and debounces them and
/// hands jobs to a [`JobDispatcher`], so slow conversions never block event
/// delivery.
///
/// Dropping a `ChangeWatcher` while watching releases the OS watch but does
/// not wait for in-flight jobs; call [`stop`](Self::stop) for that.
pub struct ChangeWatcher {
    pipeline: Arc<ConversionPipeline>,
    options: WatchOptions,
    results: Option<mpsc::UnboundedSender<ConversionResult>>,
    state: WatcherState,
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("options", &self.options)
            .field("watching", &self.is_watching())
            .finish_non_exhaustive()
    }
}

impl ChangeWatcher {
    pub fn new(pipeline: Arc<ConversionPipeline>, options: WatchOptions) -> Self {
        Self {
            pipeline,
            options,
            results: None,
            state: WatcherState::Stopped,
        }
    }

    /// Forward every job result (successes, skips and failures) to `tx`.
    pub fn with_results(mut self, tx: mpsc::UnboundedSender<ConversionResult>) -> Self {
        self.results = Some(tx);
        self
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatcherState::Watching(_))
    }

    /// Roots of the current session, if watching.
    pub fn roots(&self) -> Option<&SessionRoots> {
        match &self.state {
            WatcherState::Watching(active) => Some(&active.roots),
            WatcherState::Stopped => None,
        }
    }

    /// Start watching `watch_root` recursively, mirroring into `mirror_root`.
    ///
    /// Fails with `AlreadyWatching` if a session is active, and with a
    /// config error if either root is empty or the watch root is not a
    /// directory. Must be called from within a Tokio runtime.
    pub fn start(
        &mut self,
        watch_root: impl Into<PathBuf>,
        mirror_root: impl Into<PathBuf>,
    ) -> Result<()> {
        if self.is_watching() {
            return Err(AssetMirrorError::AlreadyWatching);
        }

        let roots = Arc::new(SessionRoots::prepare(watch_root, mirror_root)?);

        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // Only fails once the event loop is gone, i.e. while stopping.
                    let _ = event_tx.send(event);
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(roots.watch_root(), RecursiveMode::Recursive)?;

        let mut dispatcher = JobDispatcher::new(Arc::clone(&self.pipeline), self.options.workers);
        if let Some(tx) = &self.results {
            dispatcher = dispatcher.with_results(tx.clone());
        }
        let dispatcher = Arc::new(dispatcher);

        let filter = EventFilter::new(
            roots.watch_root(),
            Arc::clone(self.pipeline.registry()),
            self.options.exclude.clone(),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let event_loop = tokio::spawn(run_event_loop(
            event_rx,
            shutdown_rx,
            filter,
            Arc::clone(&dispatcher),
            Arc::clone(&roots),
            self.options.debounce,
        ));

        info!(
            watch_root = ?roots.watch_root(),
            mirror_root = ?roots.mirror_root(),
            "file watcher started"
        );

        self.state = WatcherState::Watching(ActiveWatch {
            watcher,
            shutdown: shutdown_tx,
            event_loop,
            dispatcher,
            roots,
        });

        Ok(())
    }

    /// Stop watching.
    ///
    /// Releases the OS watch, discards events still inside their debounce
    /// window and jobs parked behind a running one, then waits for the
    /// running jobs to finish. Returns once the watcher is `Stopped`.
    /// Stopping a stopped watcher is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let WatcherState::Watching(active) =
            std::mem::replace(&mut self.state, WatcherState::Stopped)
        else {
            return Ok(());
        };

        let ActiveWatch {
            watcher,
            shutdown,
            event_loop,
            dispatcher,
            roots,
        } = active;

        drop(watcher);
        let _ = shutdown.send(());
        if let Err(e) = event_loop.await {
            warn!(error = %e, "watch event loop panicked");
        }

        dispatcher.close();
        dispatcher.drain().await;

        info!(watch_root = ?roots.watch_root(), "file watcher stopped");
        Ok(())
    }
}

async fn run_event_loop(
    mut events: mpsc::UnboundedReceiver<Event>,
    mut shutdown: oneshot::Receiver<()>,
    filter: EventFilter,
    dispatcher: Arc<JobDispatcher>,
    roots: Arc<SessionRoots>,
    debounce: Duration,
) {
    let mut queue = DebounceQueue::new(debounce);

    loop {
        let next_deadline = queue.next_deadline();

        tokio::select! {
            _ = &mut shutdown => {
                if !queue.is_empty() {
                    debug!(discarded = queue.len(), "discarding debounced events on stop");
                }
                break;
            }

            maybe_event = events.recv() => {
                let Some(event) = maybe_event else {
                    debug!("notify channel closed");
                    break;
                };
                debug!(?event, "received notify event");

                let mut paths = filter.qualifying_paths(&event);
                if EventFilter::needs_rescan(&event) {
                    warn!(watch_root = ?roots.watch_root(), "watcher dropped events; rescanning tree");
                    paths.extend(rescan(&filter).await);
                }

                for path in paths {
                    if debounce.is_zero() {
                        dispatch(&filter, &dispatcher, &roots, path);
                    } else {
                        queue.touch(path, std::time::Instant::now());
                    }
                }
            }

            _ = tokio::time::sleep_until(
                next_deadline.map(Instant::from_std).unwrap_or_else(Instant::now)
            ), if next_deadline.is_some() => {
                for path in queue.take_due(std::time::Instant::now()) {
                    dispatch(&filter, &dispatcher, &roots, path);
                }
            }
        }
    }

    debug!("watcher event loop finished");
}

async fn rescan(filter: &EventFilter) -> Vec<PathBuf> {
    let filter = filter.clone();
    match tokio::task::spawn_blocking(move || filter.rescan_paths()).await {
        Ok(paths) => {
            debug!(found = paths.len(), "rescan finished");
            paths
        }
        Err(e) => {
            warn!(error = %e, "rescan task failed");
            Vec::new()
        }
    }
}

fn dispatch(
    filter: &EventFilter,
    dispatcher: &JobDispatcher,
    roots: &Arc<SessionRoots>,
    path: PathBuf,
) {
    match ConversionJob::classify(filter.registry(), &path, roots, JobOrigin::Watch) {
        Some(job) => {
            debug!(source = ?job.source_path, kind = %job.kind, "dispatching watch job");
            dispatcher.submit(job);
        }
        None => debug!(?path, "path no longer recognized; ignoring"),
    }
}
