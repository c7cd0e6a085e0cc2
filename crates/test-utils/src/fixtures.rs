#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetmirror::convert::{Converter, ConverterRegistry};
use assetmirror::pipeline::{ConversionPipeline, RecentChangeLog, SessionRoots};
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

/// A temporary watch root / mirror root pair.
///
/// The watch root is canonicalized so that paths built from it match the
/// ones reported by the OS watcher.
pub struct TestRoots {
    _dir: TempDir,
    pub watch: PathBuf,
    pub mirror: PathBuf,
}

impl TestRoots {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let base = dir.path().canonicalize().expect("canonicalize tempdir");
        let watch = base.join("source");
        let mirror = base.join("export");
        fs::create_dir_all(&watch).expect("create watch root");
        Self {
            _dir: dir,
            watch,
            mirror,
        }
    }

    pub fn session(&self) -> Arc<SessionRoots> {
        Arc::new(SessionRoots::prepare(&self.watch, &self.mirror).expect("prepare roots"))
    }

    /// Write `contents` at `rel` under the watch root, creating parents.
    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.watch.join(rel);
        write_file(&path, contents);
        path
    }

    pub fn mirrored(&self, rel: &str) -> PathBuf {
        self.mirror.join(rel)
    }
}

impl Default for TestRoots {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}

/// Write a small RGBA gradient as a PNG.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 16 % 256) as u8, (y * 16 % 256) as u8, 128, 255])
    });
    img.save_with_format(path, ImageFormat::Png)
        .expect("write png fixture");
}

/// Write a flattened 8-bit RGB Photoshop file with raw (uncompressed)
/// planar image data and empty color-mode, resource and layer sections.
///
/// Pixel `(x, y)` is `[x * 40, y * 60, 200]`.
pub fn write_psd(path: &Path, width: u32, height: u32) {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"8BPS");
    bytes.extend_from_slice(&1u16.to_be_bytes()); // version
    bytes.extend_from_slice(&[0u8; 6]); // reserved
    bytes.extend_from_slice(&3u16.to_be_bytes()); // channels
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&8u16.to_be_bytes()); // depth
    bytes.extend_from_slice(&3u16.to_be_bytes()); // RGB color mode

    // Color mode data, image resources, layer and mask info.
    for _ in 0..3 {
        bytes.extend_from_slice(&0u32.to_be_bytes());
    }

    bytes.extend_from_slice(&0u16.to_be_bytes()); // raw image data
    for channel in 0..3u32 {
        for y in 0..height {
            for x in 0..width {
                let value = match channel {
                    0 => x * 40,
                    1 => y * 60,
                    _ => 200,
                };
                bytes.push((value % 256) as u8);
            }
        }
    }

    write_file(path, &bytes);
}

/// Registry with a single hand-registered converter.
pub fn registry_with(converter: Arc<dyn Converter>, extensions: &[&str]) -> ConverterRegistry {
    let mut registry = ConverterRegistry::new();
    registry.register(converter, extensions.iter().copied());
    registry
}

/// Pipeline whose sink records into a `RecentChangeLog`.
pub fn recording_pipeline(
    registry: ConverterRegistry,
    log_capacity: usize,
) -> (Arc<ConversionPipeline>, Arc<RecentChangeLog>) {
    let log = Arc::new(RecentChangeLog::new(log_capacity));
    let pipeline = ConversionPipeline::new(Arc::new(registry), log.clone());
    (Arc::new(pipeline), log)
}
