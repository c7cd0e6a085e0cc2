// src/pipeline/copy.rs

//! Directory creation and atomic file replacement.
//!
//! Files are staged in a temporary file in the destination directory and
//! renamed over the destination, so a concurrent reader sees either the old
//! content or the new content, never a partial write.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::errors::{AssetMirrorError, Result};

const TEMP_PREFIX: &str = ".assetmirror-";
const TEMP_SUFFIX: &str = ".tmp";

/// Create `dir` and its parents if absent.
///
/// Another job creating the same directory at the same time is not an error.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(AssetMirrorError::io(dir, e)),
    }
}

/// Copy `from` over `to` atomically. Returns the number of bytes copied.
pub fn copy_atomic(from: &Path, to: &Path) -> Result<u64> {
    let mut input = File::open(from).map_err(|e| AssetMirrorError::io(from, e))?;
    let mut tmp = staging_file(to)?;

    let copied = io::copy(&mut input, tmp.as_file_mut()).map_err(|e| AssetMirrorError::io(to, e))?;

    if let Ok(meta) = input.metadata() {
        // Best effort: mirrored files keep the source's permissions.
        let _ = fs::set_permissions(tmp.path(), meta.permissions());
    }

    commit(tmp, to)?;
    Ok(copied)
}

/// Write `bytes` to `to` atomically.
pub fn write_atomic(to: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = staging_file(to)?;
    tmp.as_file_mut()
        .write_all(bytes)
        .map_err(|e| AssetMirrorError::io(to, e))?;

    if let Ok(meta) = fs::metadata(to) {
        let _ = fs::set_permissions(tmp.path(), meta.permissions());
    }

    commit(tmp, to)
}

fn staging_file(to: &Path) -> Result<NamedTempFile> {
    let dir = match to.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }

    builder
        .tempfile_in(dir)
        .map_err(|e| AssetMirrorError::io(dir, e))
}

fn commit(tmp: NamedTempFile, to: &Path) -> Result<()> {
    tmp.as_file()
        .sync_all()
        .map_err(|e| AssetMirrorError::io(to, e))?;
    // On failure the temp file is dropped and removed; `to` is untouched.
    tmp.persist(to)
        .map_err(|e| AssetMirrorError::io(to, e.error))?;
    Ok(())
}
