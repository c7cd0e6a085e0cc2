#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assetmirror::convert::{AssetKind, ConvertFuture, Converter};
use assetmirror::errors::AssetMirrorError;

#[derive(Default)]
struct Activity {
    calls: Vec<PathBuf>,
    active: HashSet<PathBuf>,
    running: usize,
    max_running: usize,
    overlaps: usize,
}

/// A fake converter that:
/// - copies the source bytes to the derived path after an optional delay
/// - records every call, in start order
/// - counts conversions of the same path that overlapped in time
/// - tracks the peak number of conversions running at once.
pub struct RecordingConverter {
    kind: AssetKind,
    target: String,
    delay: Duration,
    activity: Mutex<Activity>,
}

impl RecordingConverter {
    pub fn new(kind: AssetKind, target: &str) -> Self {
        Self {
            kind,
            target: target.to_string(),
            delay: Duration::ZERO,
            activity: Mutex::new(Activity::default()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.activity.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.activity.lock().unwrap().calls.len()
    }

    pub fn calls_for(&self, path: &Path) -> usize {
        self.activity
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|p| p.as_path() == path)
            .count()
    }

    /// Times a conversion started while another one for the same path was
    /// still running.
    pub fn overlaps(&self) -> usize {
        self.activity.lock().unwrap().overlaps
    }

    pub fn max_running(&self) -> usize {
        self.activity.lock().unwrap().max_running
    }

    fn enter(&self, source: &Path) {
        let mut a = self.activity.lock().unwrap();
        a.calls.push(source.to_path_buf());
        if !a.active.insert(source.to_path_buf()) {
            a.overlaps += 1;
        }
        a.running += 1;
        a.max_running = a.max_running.max(a.running);
    }

    fn exit(&self, source: &Path) {
        let mut a = self.activity.lock().unwrap();
        a.active.remove(source);
        a.running -= 1;
    }
}

impl Converter for RecordingConverter {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn target_extension(&self) -> &str {
        &self.target
    }

    fn convert<'a>(&'a self, source: &'a Path, derived: &'a Path) -> ConvertFuture<'a> {
        Box::pin(async move {
            self.enter(source);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let copied = tokio::fs::copy(source, derived).await;
            self.exit(source);
            copied.map_err(|e| AssetMirrorError::io(source, e))?;
            Ok(derived.to_path_buf())
        })
    }
}

/// A converter that always fails with a `ConversionError`.
pub struct FailingConverter {
    kind: AssetKind,
    target: String,
    calls: AtomicUsize,
}

impl FailingConverter {
    pub fn new(kind: AssetKind, target: &str) -> Self {
        Self {
            kind,
            target: target.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Converter for FailingConverter {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn target_extension(&self) -> &str {
        &self.target
    }

    fn convert<'a>(&'a self, source: &'a Path, _derived: &'a Path) -> ConvertFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AssetMirrorError::conversion(source, "simulated converter failure"))
        })
    }
}

/// A converter that panics when the source holds exactly `trigger`, and
/// otherwise copies the source to the derived path.
pub struct PanickingConverter {
    kind: AssetKind,
    target: String,
    trigger: Vec<u8>,
    calls: AtomicUsize,
}

impl PanickingConverter {
    pub fn new(kind: AssetKind, target: &str, trigger: &[u8]) -> Self {
        Self {
            kind,
            target: target.to_string(),
            trigger: trigger.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Converter for PanickingConverter {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn target_extension(&self) -> &str {
        &self.target
    }

    fn convert<'a>(&'a self, source: &'a Path, derived: &'a Path) -> ConvertFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let bytes = tokio::fs::read(source)
                .await
                .map_err(|e| AssetMirrorError::io(source, e))?;
            if bytes == self.trigger {
                panic!("converter blew up on {}", source.display());
            }
            tokio::fs::write(derived, &bytes)
                .await
                .map_err(|e| AssetMirrorError::io(derived, e))?;
            Ok(derived.to_path_buf())
        })
    }
}
