// src/pipeline/paths.rs

//! Source → derived → mirrored path mapping.

use std::path::{Component, Path, PathBuf};

use crate::errors::{AssetMirrorError, Result};

/// Where a converted artifact lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPaths {
    /// Beside the source: same directory, same base name, new extension.
    pub derived: PathBuf,
    /// `mirror_root / relative(source, watch_root)` with the new extension.
    pub mirrored: PathBuf,
}

/// Map a source file to its derived and mirrored paths.
///
/// Pure: no filesystem access. Fails with `PathError` when `source` is not a
/// file path strictly below `watch_root`.
///
/// ```
/// use std::path::Path;
/// use assetmirror::pipeline::map_paths;
///
/// let paths = map_paths(
///     Path::new("/src/art/hero.psd"),
///     Path::new("/src"),
///     Path::new("/out"),
///     "tga",
/// )
/// .unwrap();
/// assert_eq!(paths.derived, Path::new("/src/art/hero.tga"));
/// assert_eq!(paths.mirrored, Path::new("/out/art/hero.tga"));
/// ```
pub fn map_paths(
    source: &Path,
    watch_root: &Path,
    mirror_root: &Path,
    target_ext: &str,
) -> Result<MappedPaths> {
    let path_error = || AssetMirrorError::PathError {
        path: source.to_path_buf(),
        root: watch_root.to_path_buf(),
    };

    let rel = source.strip_prefix(watch_root).map_err(|_| path_error())?;

    if rel.file_name().is_none()
        || rel.components().any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(path_error());
    }

    Ok(MappedPaths {
        derived: source.with_extension(target_ext),
        mirrored: mirror_root.join(rel.with_extension(target_ext)),
    })
}
