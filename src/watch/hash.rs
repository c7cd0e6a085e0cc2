// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use blake3::Hasher;
use tracing::debug;

use crate::errors::{AssetMirrorError, Result};

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path).map_err(|e| AssetMirrorError::io(path, e))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| AssetMirrorError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// In-memory record of the source content last mirrored for each path.
///
/// Editors often emit several modify events for a single save, and a
/// touch without a content change is still an event; comparing fingerprints
/// lets the pipeline drop those without re-running a converter.
#[derive(Debug, Default)]
pub struct ContentHashes {
    hashes: Mutex<HashMap<PathBuf, String>>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint recorded for `path` by the last successful mirror, if any.
    pub fn last_mirrored(&self, path: &Path) -> Option<String> {
        self.hashes.lock().ok()?.get(path).cloned()
    }

    pub fn record(&self, path: &Path, hash: String) {
        if let Ok(mut map) = self.hashes.lock() {
            debug!(?path, hash = %hash, "recorded source fingerprint");
            map.insert(path.to_path_buf(), hash);
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
