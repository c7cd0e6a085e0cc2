// src/watch/event_handler.rs

//! Classification and per-path debouncing of raw filesystem events.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::{debug, warn};

use crate::convert::ConverterRegistry;
use crate::scan::TreeScanner;
use crate::watch::patterns::{relative_str, ExcludeMatcher};

/// Upper bound on how long continuous writes can postpone a job, as a
/// multiple of the debounce window.
const MAX_DELAY_WINDOWS: u32 = 10;

/// Decides which paths of a raw `notify` event are worth converting.
///
/// A path qualifies when the event kind means "content may have changed",
/// the path is a regular file under the watch root, its extension is
/// recognized, and it is not excluded.
#[derive(Debug, Clone)]
pub struct EventFilter {
    root: PathBuf,
    registry: Arc<ConverterRegistry>,
    exclude: ExcludeMatcher,
}

impl EventFilter {
    pub fn new(
        root: impl Into<PathBuf>,
        registry: Arc<ConverterRegistry>,
        exclude: ExcludeMatcher,
    ) -> Self {
        Self {
            root: root.into(),
            registry,
            exclude,
        }
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Event kinds that can leave a file with new content.
    pub fn is_content_event(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::Any
                | EventKind::Create(CreateKind::File | CreateKind::Any)
                | EventKind::Modify(
                    ModifyKind::Any
                        | ModifyKind::Data(_)
                        | ModifyKind::Name(RenameMode::To | RenameMode::Both | RenameMode::Any)
                )
                | EventKind::Access(AccessKind::Close(AccessMode::Write))
        )
    }

    /// Paths of `event` that should become conversion jobs.
    pub fn qualifying_paths(&self, event: &Event) -> Vec<PathBuf> {
        if !Self::is_content_event(&event.kind) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter(|p| self.accepts(p))
            .cloned()
            .collect()
    }

    /// True when the backend dropped events (e.g. an inotify queue
    /// overflow) and the tree has to be re-walked to catch up.
    pub fn needs_rescan(event: &Event) -> bool {
        event.need_rescan()
    }

    /// Every recognized, non-excluded file currently under the root.
    ///
    /// Blocking; call it off the async runtime.
    pub fn rescan_paths(&self) -> Vec<PathBuf> {
        TreeScanner::new(Arc::clone(&self.registry), self.exclude.clone())
            .scan(&self.root)
            .collect()
    }

    /// Path-level checks, independent of the event kind.
    pub fn accepts(&self, path: &Path) -> bool {
        if !self.registry.is_recognized(path) {
            return false;
        }

        let Some(rel) = relative_str(&self.root, path) else {
            warn!(?path, root = ?self.root, "event path is outside the watch root");
            return false;
        };

        if self.exclude.is_excluded(&rel) {
            debug!(rel = %rel, "path excluded by [watch].exclude");
            return false;
        }

        // Removed files and the "from" side of renames no longer exist.
        path.is_file()
    }
}

/// Trailing-edge debounce keyed by path.
///
/// Each touch pushes the path's deadline to `now + window`; a path that keeps
/// being touched is still released after `MAX_DELAY_WINDOWS * window` from its
/// first touch.
#[derive(Debug)]
pub struct DebounceQueue {
    window: Duration,
    max_delay: Duration,
    entries: HashMap<PathBuf, (Instant, Instant)>,
}

impl DebounceQueue {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            max_delay: window * MAX_DELAY_WINDOWS,
            entries: HashMap::new(),
        }
    }

    pub fn touch(&mut self, path: PathBuf, now: Instant) {
        self.entries
            .entry(path)
            .and_modify(|(_, last)| *last = now)
            .or_insert((now, now));
    }

    fn deadline(&self, first: Instant, last: Instant) -> Instant {
        (last + self.window).min(first + self.max_delay)
    }

    /// Earliest moment at which some path becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .values()
            .map(|&(first, last)| self.deadline(first, last))
            .min()
    }

    /// Remove and return every path whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let due: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|&(_, &(first, last))| self.deadline(first, last) <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &due {
            self.entries.remove(path);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
