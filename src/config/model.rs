// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// watch_root = "/projects/game/source"
/// mirror_root = "/projects/game/export"
///
/// [texture]
/// extensions = ["psd"]
/// target = "tga"
///
/// [scene]
/// extensions = ["ma"]
/// target = "fbx"
/// exporter = "mayapy"
/// exporter_args = ["maya_fbx_export.py"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; see [`ConfigFile`] for the validated one.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub texture: TextureSection,

    #[serde(default)]
    pub scene: SceneSection,

    #[serde(default)]
    pub resync: ResyncSection,

    #[serde(default)]
    pub log: LogSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on extensions being disjoint and counts being
/// non-zero.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub watch: WatchSection,
    pub texture: TextureSection,
    pub scene: SceneSection,
    pub resync: ResyncSection,
    pub log: LogSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            watch: raw.watch,
            texture: raw.texture,
            scene: raw.scene,
            resync: raw.resync,
            log: raw.log,
        }
    }
}

/// `[paths]` section. Either root may also come from the command line.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PathsSection {
    #[serde(default)]
    pub watch_root: Option<PathBuf>,

    #[serde(default)]
    pub mirror_root: Option<PathBuf>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Quiet period per path before a burst of events becomes one job.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of conversions running at once while watching.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Skip watch events whose source content is identical to what was last
    /// mirrored successfully.
    #[serde(default = "default_true")]
    pub skip_unchanged: bool,

    /// Glob patterns (relative to the watch root) that are never converted.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl WatchSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            workers: default_workers(),
            skip_unchanged: true,
            exclude: Vec::new(),
        }
    }
}

/// `[texture]` section: in-process image re-encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct TextureSection {
    #[serde(default = "default_texture_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_texture_target")]
    pub target: String,
}

impl Default for TextureSection {
    fn default() -> Self {
        Self {
            extensions: default_texture_extensions(),
            target: default_texture_target(),
        }
    }
}

/// `[scene]` section: export through an external tool.
///
/// The exporter is invoked as `exporter exporter_args... <source> <output>`.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSection {
    #[serde(default = "default_scene_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_scene_target")]
    pub target: String,

    #[serde(default = "default_exporter")]
    pub exporter: String,

    #[serde(default)]
    pub exporter_args: Vec<String>,

    /// Upper bound on a single exporter run; the process is killed after it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SceneSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            extensions: default_scene_extensions(),
            target: default_scene_target(),
            exporter: default_exporter(),
            exporter_args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[resync]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ResyncSection {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ResyncSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    /// Number of recently mirrored paths to remember.
    #[serde(default = "default_recent_size")]
    pub recent_size: usize,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            recent_size: default_recent_size(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_texture_extensions() -> Vec<String> {
    vec!["psd".to_string()]
}

fn default_texture_target() -> String {
    "tga".to_string()
}

fn default_scene_extensions() -> Vec<String> {
    vec!["ma".to_string()]
}

fn default_scene_target() -> String {
    "fbx".to_string()
}

fn default_exporter() -> String {
    "mayapy".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_recent_size() -> usize {
    10
}
