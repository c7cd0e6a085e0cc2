// src/pipeline/sink.rs

//! Completion notifications.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Receives the mirrored path of every successfully processed job, in
/// completion order.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, mirrored: &Path);
}

impl<F> NotificationSink for F
where
    F: Fn(&Path) + Send + Sync,
{
    fn notify(&self, mirrored: &Path) {
        self(mirrored)
    }
}

/// Sink that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _mirrored: &Path) {}
}

/// Bounded list of the most recently mirrored paths, newest first.
///
/// Observational only: once full, the oldest entry is evicted.
#[derive(Debug)]
pub struct RecentChangeLog {
    capacity: usize,
    entries: Mutex<VecDeque<PathBuf>>,
}

impl RecentChangeLog {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, path: impl Into<PathBuf>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.push_front(path.into());
        entries.truncate(self.capacity);
    }

    /// Current entries, newest first.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for RecentChangeLog {
    fn notify(&self, mirrored: &Path) {
        self.push(mirrored);
    }
}
