#![allow(dead_code)]

use std::path::PathBuf;

use assetmirror::config::{ConfigFile, RawConfigFile};
use assetmirror::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults (`psd -> tga`, `ma -> fbx`).
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_roots(mut self, watch: impl Into<PathBuf>, mirror: impl Into<PathBuf>) -> Self {
        self.config.paths.watch_root = Some(watch.into());
        self.config.paths.mirror_root = Some(mirror.into());
        self
    }

    pub fn with_texture(mut self, extensions: &[&str], target: &str) -> Self {
        self.config.texture.extensions = extensions.iter().map(|s| s.to_string()).collect();
        self.config.texture.target = target.to_string();
        self
    }

    pub fn with_scene(mut self, extensions: &[&str], target: &str) -> Self {
        self.config.scene.extensions = extensions.iter().map(|s| s.to_string()).collect();
        self.config.scene.target = target.to_string();
        self
    }

    pub fn with_exporter(mut self, program: &str, args: &[&str]) -> Self {
        self.config.scene.exporter = program.to_string();
        self.config.scene.exporter_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scene.timeout_secs = secs;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.watch.workers = workers;
        self.config.resync.workers = workers;
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn with_skip_unchanged(mut self, val: bool) -> Self {
        self.config.watch.skip_unchanged = val;
        self
    }

    pub fn with_recent_size(mut self, size: usize) -> Self {
        self.config.log.recent_size = size;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
