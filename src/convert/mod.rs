// src/convert/mod.rs

//! Asset converters and the extension → converter registry.
//!
//! - [`texture`] re-encodes raster images in-process.
//! - [`scene`] runs an external exporter process.
//!
//! The pipeline only talks to the [`Converter`] trait, so tests can register
//! instrumented converters in place of the real ones.

pub mod scene;
pub mod texture;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::Result;

pub use scene::SceneConverter;
pub use texture::TextureConverter;

/// Kind of source asset. Each kind has exactly one converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// 2D texture source (e.g. `.psd`) → re-encoded image (e.g. `.tga`).
    Texture,
    /// 3D scene source (e.g. `.ma`) → exported model (e.g. `.fbx`).
    Scene,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Texture => f.write_str("texture"),
            AssetKind::Scene => f.write_str("scene"),
        }
    }
}

pub type ConvertFuture<'a> = Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>>;

/// A capability that turns one source file into one derived file.
pub trait Converter: Send + Sync {
    fn kind(&self) -> AssetKind;

    /// Extension (without dot) of the files this converter produces.
    fn target_extension(&self) -> &str;

    /// Convert `source` and write the result to `derived`.
    ///
    /// Returns the path of the produced artifact (normally `derived`).
    fn convert<'a>(&'a self, source: &'a Path, derived: &'a Path) -> ConvertFuture<'a>;
}

/// Maps source extensions to asset kinds, and kinds to converters.
///
/// Extension lookup is case-sensitive: with `psd` registered, `hero.PSD` is
/// not recognized.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    kinds: HashMap<String, AssetKind>,
    converters: HashMap<AssetKind, Arc<dyn Converter>>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry with the two built-in converters from config.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut registry = Self::new();

        if !cfg.texture.extensions.is_empty() {
            registry.register(
                Arc::new(TextureConverter::from_config(&cfg.texture)),
                cfg.texture.extensions.iter().cloned(),
            );
        }

        if !cfg.scene.extensions.is_empty() {
            registry.register(
                Arc::new(SceneConverter::from_config(&cfg.scene)),
                cfg.scene.extensions.iter().cloned(),
            );
        }

        registry
    }

    /// Register `converter` for its kind and route `extensions` to it.
    ///
    /// Registering a second converter for the same kind replaces the first.
    pub fn register<I, S>(&mut self, converter: Arc<dyn Converter>, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kind = converter.kind();
        for ext in extensions {
            self.kinds.insert(ext.into(), kind);
        }
        self.converters.insert(kind, converter);
    }

    /// Converter for a source extension (without dot), if recognized.
    pub fn resolve(&self, extension: &str) -> Option<Arc<dyn Converter>> {
        let kind = self.kind_of(extension)?;
        self.converter_for(kind)
    }

    pub fn kind_of(&self, extension: &str) -> Option<AssetKind> {
        self.kinds.get(extension).copied()
    }

    pub fn converter_for(&self, kind: AssetKind) -> Option<Arc<dyn Converter>> {
        self.converters.get(&kind).cloned()
    }

    /// Asset kind of a path, from its final extension.
    pub fn classify(&self, path: &Path) -> Option<AssetKind> {
        let ext = path.extension()?.to_str()?;
        self.kind_of(ext)
    }

    pub fn is_recognized(&self, path: &Path) -> bool {
        self.classify(path).is_some()
    }

    /// All registered source extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}
