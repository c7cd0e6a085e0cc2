// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetMirrorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The source path does not live under the watch root. Indicates a wiring
    /// bug rather than a user-facing condition.
    #[error("path {path:?} is not under watch root {root:?}")]
    PathError { path: PathBuf, root: PathBuf },

    #[error("conversion of {path:?} failed: {reason}")]
    ConversionError { path: PathBuf, reason: String },

    #[error("exporter failed for {path:?}: {reason}")]
    ProcessError { path: PathBuf, reason: String },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watcher is already running")]
    AlreadyWatching,

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetMirrorError {
    /// Attach a path to a raw `std::io::Error`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        AssetMirrorError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn conversion(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        AssetMirrorError::ConversionError {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn process(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        AssetMirrorError::ProcessError {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssetMirrorError>;
