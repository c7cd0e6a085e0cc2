// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{AssetMirrorError, Result};

/// Compiled `[watch].exclude` glob patterns.
///
/// Patterns are evaluated against paths relative to the watch root with
/// forward slashes, e.g. `"art/wip/hero.psd"`. An empty pattern list excludes
/// nothing.
#[derive(Clone, Default)]
pub struct ExcludeMatcher {
    set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeMatcher")
            .field("patterns", &self.set.as_ref().map_or(0, GlobSet::len))
            .finish()
    }
}

impl ExcludeMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let set = build_globset(patterns).map_err(|e| {
            AssetMirrorError::ConfigError(format!("[watch].exclude: {e:#}"))
        })?;
        Ok(Self { set: Some(set) })
    }

    /// Returns true if the relative path (e.g. `"art/wip/hero.psd"`) is excluded.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        match &self.set {
            Some(set) => set.is_match(rel_path),
            None => false,
        }
    }

    /// Like [`is_excluded`](Self::is_excluded), but relativizes `path`
    /// against `root` first. Paths outside `root` are never excluded here;
    /// the path mapper rejects them later.
    pub fn is_excluded_under(&self, root: &Path, path: &Path) -> bool {
        if self.set.is_none() {
            return false;
        }
        match relative_str(root, path) {
            Some(rel) => self.is_excluded(&rel),
            None => false,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// `path` relative to `root` with forward slashes, or `None` when it is not
/// under `root`.
///
/// Falls back to comparing canonical forms, since watchers may report a
/// resolved prefix (`/private/var/...` on macOS) for a symlinked root.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let to_slashes = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slashes(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(to_slashes)
}
