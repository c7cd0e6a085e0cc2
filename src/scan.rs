// src/scan.rs

//! Recursive discovery of recognized source files for bulk resync.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use walkdir::WalkDir;

use crate::convert::ConverterRegistry;
use crate::watch::patterns::ExcludeMatcher;

/// Walks a directory tree and yields every recognized, non-excluded file.
///
/// Holds no traversal state: each call to [`scan`](Self::scan) re-walks the
/// tree from scratch.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    registry: Arc<ConverterRegistry>,
    exclude: ExcludeMatcher,
}

impl TreeScanner {
    pub fn new(registry: Arc<ConverterRegistry>, exclude: ExcludeMatcher) -> Self {
        Self { registry, exclude }
    }

    /// Lazily enumerate recognized files under `root`.
    ///
    /// Symlinks are not followed. Unreadable entries are logged and skipped.
    pub fn scan<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("error accessing entry during scan: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(move |path| self.registry.is_recognized(path))
            .filter(move |path| !self.exclude.is_excluded_under(root, path))
    }
}
