// src/convert/scene.rs

//! Scene export through an external tool.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SceneSection;
use crate::convert::{AssetKind, ConvertFuture, Converter};
use crate::errors::{AssetMirrorError, Result};

/// How many trailing stderr lines are kept in a `ProcessError`.
const STDERR_TAIL_LINES: usize = 5;

/// Runs `program args... <source> <derived>` and expects the exporter to
/// deposit its result at `<derived>`.
///
/// A run fails when the process cannot be spawned, exits non-zero, exceeds
/// the timeout (the child is killed), or exits cleanly without producing the
/// output file. Failures are never retried here.
#[derive(Debug, Clone)]
pub struct SceneConverter {
    program: String,
    args: Vec<String>,
    target_ext: String,
    timeout: Duration,
}

impl SceneConverter {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        target_ext: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            target_ext: target_ext.into(),
            timeout,
        }
    }

    pub fn from_config(section: &SceneSection) -> Self {
        Self::new(
            section.exporter.clone(),
            section.exporter_args.clone(),
            section.target.clone(),
            section.timeout(),
        )
    }

    async fn export(&self, source: &Path, derived: &Path) -> Result<()> {
        // A leftover artifact from an earlier run must not pass the
        // "output exists" check below.
        match tokio::fs::remove_file(derived).await {
            Ok(()) => debug!(?derived, "removed stale exporter output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(AssetMirrorError::io(derived, e)),
        }

        info!(
            program = %self.program,
            ?source,
            ?derived,
            "starting exporter process"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(source)
            .arg(derived)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            AssetMirrorError::process(source, format!("spawning '{}': {e}", self.program))
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(|e| {
                AssetMirrorError::process(source, format!("waiting for exporter: {e}"))
            })?,
            Err(_) => {
                return Err(AssetMirrorError::process(
                    source,
                    format!("exporter timed out after {}s", self.timeout.as_secs_f64()),
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!(program = %self.program, "stdout: {}", line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(program = %self.program, "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        info!(
            program = %self.program,
            exit_code = code,
            success = output.status.success(),
            "exporter process exited"
        );

        if !output.status.success() {
            let tail = stderr_tail(&stderr);
            let reason = if tail.is_empty() {
                format!("exporter exited with code {code}")
            } else {
                format!("exporter exited with code {code}: {tail}")
            };
            return Err(AssetMirrorError::process(source, reason));
        }

        if !tokio::fs::try_exists(derived).await.unwrap_or(false) {
            return Err(AssetMirrorError::process(
                source,
                format!("exporter exited successfully but produced no output at {derived:?}"),
            ));
        }

        Ok(())
    }
}

impl Converter for SceneConverter {
    fn kind(&self) -> AssetKind {
        AssetKind::Scene
    }

    fn target_extension(&self) -> &str {
        &self.target_ext
    }

    fn convert<'a>(&'a self, source: &'a Path, derived: &'a Path) -> ConvertFuture<'a> {
        Box::pin(async move {
            self.export(source, derived).await?;
            Ok(derived.to_path_buf())
        })
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
