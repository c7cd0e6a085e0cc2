// src/pipeline/job.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::convert::{AssetKind, ConverterRegistry};
use crate::errors::{AssetMirrorError, Result};
use crate::pipeline::paths::{map_paths, MappedPaths};

/// The watch/mirror root pair for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRoots {
    watch_root: PathBuf,
    mirror_root: PathBuf,
}

impl SessionRoots {
    /// Build roots without touching the filesystem.
    pub fn new(watch_root: impl Into<PathBuf>, mirror_root: impl Into<PathBuf>) -> Self {
        Self {
            watch_root: watch_root.into(),
            mirror_root: mirror_root.into(),
        }
    }

    /// Validate and prepare roots for a session.
    ///
    /// - both paths must be non-empty;
    /// - the watch root must be an existing directory, and is canonicalized
    ///   so that paths reported by the OS watcher share its prefix;
    /// - the mirror root is created if it does not exist yet.
    pub fn prepare(
        watch_root: impl Into<PathBuf>,
        mirror_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let watch_root = watch_root.into();
        let mirror_root = mirror_root.into();

        if watch_root.as_os_str().is_empty() {
            return Err(AssetMirrorError::ConfigError(
                "watch root must not be empty".to_string(),
            ));
        }
        if mirror_root.as_os_str().is_empty() {
            return Err(AssetMirrorError::ConfigError(
                "mirror root must not be empty".to_string(),
            ));
        }
        if !watch_root.is_dir() {
            return Err(AssetMirrorError::ConfigError(format!(
                "watch root {watch_root:?} does not exist or is not a directory"
            )));
        }

        let watch_root = watch_root
            .canonicalize()
            .map_err(|e| AssetMirrorError::io(&watch_root, e))?;

        fs::create_dir_all(&mirror_root).map_err(|e| AssetMirrorError::io(&mirror_root, e))?;
        if !mirror_root.is_dir() {
            return Err(AssetMirrorError::ConfigError(format!(
                "mirror root {mirror_root:?} is not a directory"
            )));
        }

        Ok(Self {
            watch_root,
            mirror_root,
        })
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    pub fn map(&self, source: &Path, target_ext: &str) -> Result<MappedPaths> {
        map_paths(source, &self.watch_root, &self.mirror_root, target_ext)
    }
}

/// Which execution mode produced a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOrigin {
    /// Filesystem event from the live watcher.
    Watch,
    /// Discovered by a bulk resync scan.
    Resync,
}

/// One unit of conversion work for one source path.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source_path: PathBuf,
    pub roots: Arc<SessionRoots>,
    pub kind: AssetKind,
    pub origin: JobOrigin,
}

impl ConversionJob {
    pub fn new(
        source_path: impl Into<PathBuf>,
        roots: Arc<SessionRoots>,
        kind: AssetKind,
        origin: JobOrigin,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            roots,
            kind,
            origin,
        }
    }

    /// Build a job for `source` if its extension is recognized.
    pub fn classify(
        registry: &ConverterRegistry,
        source: &Path,
        roots: &Arc<SessionRoots>,
        origin: JobOrigin,
    ) -> Option<Self> {
        let kind = registry.classify(source)?;
        Some(Self::new(source, Arc::clone(roots), kind, origin))
    }
}

/// Why a job finished without producing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No converter is registered for the job's kind.
    Unrecognized,
    /// Source content matches what was last mirrored.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Mirrored(MappedPaths),
    Skipped(SkipReason),
}

/// A failed job. Only this file was affected.
#[derive(Debug, Error)]
#[error("failed to mirror {source_path:?}: {error}")]
pub struct JobFailure {
    pub source_path: PathBuf,
    #[source]
    pub error: AssetMirrorError,
}

pub type ConversionResult = std::result::Result<JobOutcome, JobFailure>;
