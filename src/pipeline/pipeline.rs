// src/pipeline/pipeline.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::convert::ConverterRegistry;
use crate::errors::{AssetMirrorError, Result};
use crate::pipeline::copy::{copy_atomic, ensure_dir};
use crate::pipeline::job::{
    ConversionJob, ConversionResult, JobFailure, JobOrigin, JobOutcome, SkipReason,
};
use crate::pipeline::sink::NotificationSink;
use crate::watch::hash::{compute_file_hash, ContentHashes};

/// Converts one source file and mirrors the result.
///
/// This is the single unit of work behind both the live watcher and bulk
/// resync. A failing job only affects its own file; the pipeline itself
/// holds no per-job state and stays usable.
pub struct ConversionPipeline {
    registry: Arc<ConverterRegistry>,
    sink: Arc<dyn NotificationSink>,
    fingerprints: Option<ContentHashes>,
}

impl fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("registry", &self.registry)
            .field("skip_unchanged", &self.fingerprints.is_some())
            .finish_non_exhaustive()
    }
}

impl ConversionPipeline {
    pub fn new(registry: Arc<ConverterRegistry>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            registry,
            sink,
            fingerprints: None,
        }
    }

    /// Drop watch-originated jobs whose source content is identical to the
    /// content last mirrored successfully. Resync jobs always run.
    pub fn with_skip_unchanged(mut self, enabled: bool) -> Self {
        self.fingerprints = enabled.then(ContentHashes::new);
        self
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Run one job to completion.
    ///
    /// Steps: resolve converter, map paths, (optionally) compare the source
    /// fingerprint, create the mirror directory, convert from the original
    /// source, atomically copy the derived file into the mirror tree, notify
    /// the sink.
    pub async fn process(&self, job: &ConversionJob) -> ConversionResult {
        match self.run(job).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                warn!(
                    source = ?job.source_path,
                    kind = %job.kind,
                    error = %error,
                    "conversion job failed"
                );
                Err(JobFailure {
                    source_path: job.source_path.clone(),
                    error,
                })
            }
        }
    }

    async fn run(&self, job: &ConversionJob) -> Result<JobOutcome> {
        let Some(converter) = self.registry.converter_for(job.kind) else {
            debug!(source = ?job.source_path, kind = %job.kind, "no converter registered; skipping");
            return Ok(JobOutcome::Skipped(SkipReason::Unrecognized));
        };

        let paths = job.roots.map(&job.source_path, converter.target_extension())?;

        let fingerprint = match &self.fingerprints {
            Some(_) => Some(hash_source(&job.source_path).await?),
            None => None,
        };

        if job.origin == JobOrigin::Watch
            && self.is_unchanged(&job.source_path, fingerprint.as_deref(), &paths.mirrored)
        {
            debug!(source = ?job.source_path, "source content unchanged; skipping");
            return Ok(JobOutcome::Skipped(SkipReason::Unchanged));
        }

        if let Some(parent) = paths.mirrored.parent() {
            let parent = parent.to_path_buf();
            blocking(move || ensure_dir(&parent)).await?;
        }

        let produced = converter.convert(&job.source_path, &paths.derived).await?;
        debug!(source = ?job.source_path, derived = ?produced, "converter finished");

        {
            let from = produced.clone();
            let to = paths.mirrored.clone();
            blocking(move || copy_atomic(&from, &to)).await?;
        }

        info!(
            source = ?job.source_path,
            mirrored = ?paths.mirrored,
            kind = %job.kind,
            "mirrored asset"
        );

        if let (Some(store), Some(hash)) = (&self.fingerprints, fingerprint) {
            store.record(&job.source_path, hash);
        }

        self.sink.notify(&paths.mirrored);

        Ok(JobOutcome::Mirrored(paths))
    }

    fn is_unchanged(&self, source: &Path, fingerprint: Option<&str>, mirrored: &Path) -> bool {
        let (Some(store), Some(current)) = (&self.fingerprints, fingerprint) else {
            return false;
        };
        match store.last_mirrored(source) {
            Some(previous) if previous == current => mirrored.is_file(),
            _ => false,
        }
    }
}

async fn hash_source(source: &Path) -> Result<String> {
    let source: PathBuf = source.to_path_buf();
    blocking(move || compute_file_hash(&source)).await
}

/// Run blocking filesystem work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AssetMirrorError::Other(anyhow::anyhow!("blocking task failed: {e}")))?
}
