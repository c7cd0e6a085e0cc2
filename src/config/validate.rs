// src/config/validate.rs

use std::collections::HashSet;

use image::ImageFormat;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetMirrorError, Result};
use crate::watch::patterns::ExcludeMatcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetMirrorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Validate an already-typed config (e.g. one assembled in code).
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_extensions(cfg)?;
    validate_texture_target(cfg)?;
    validate_scene(cfg)?;
    validate_counts(cfg)?;
    ExcludeMatcher::new(&cfg.watch.exclude)?;
    Ok(())
}

fn config_err(msg: impl Into<String>) -> AssetMirrorError {
    AssetMirrorError::ConfigError(msg.into())
}

fn check_extension(section: &str, ext: &str) -> Result<()> {
    if ext.is_empty() {
        return Err(config_err(format!(
            "[{section}] contains an empty extension"
        )));
    }
    if ext.starts_with('.') {
        return Err(config_err(format!(
            "[{section}] extension '{ext}' must be given without a leading dot"
        )));
    }
    if ext.contains('/') || ext.contains('\\') {
        return Err(config_err(format!(
            "[{section}] extension '{ext}' must not contain path separators"
        )));
    }
    Ok(())
}

fn validate_extensions(cfg: &RawConfigFile) -> Result<()> {
    if cfg.texture.extensions.is_empty() && cfg.scene.extensions.is_empty() {
        return Err(config_err(
            "at least one source extension must be configured in [texture] or [scene]",
        ));
    }

    let mut sources: HashSet<&str> = HashSet::new();
    for (section, exts) in [
        ("texture", &cfg.texture.extensions),
        ("scene", &cfg.scene.extensions),
    ] {
        for ext in exts {
            check_extension(section, ext)?;
            if !sources.insert(ext.as_str()) {
                return Err(config_err(format!(
                    "source extension '{ext}' is configured more than once"
                )));
            }
        }
    }

    // A derived file must never look like a source again, or every
    // conversion would trigger another one.
    for (section, target) in [
        ("texture", &cfg.texture.target),
        ("scene", &cfg.scene.target),
    ] {
        check_extension(section, target)?;
        if sources.contains(target.as_str()) {
            return Err(config_err(format!(
                "[{section}].target '{target}' is also a source extension"
            )));
        }
    }

    Ok(())
}

fn validate_texture_target(cfg: &RawConfigFile) -> Result<()> {
    if cfg.texture.extensions.is_empty() {
        return Ok(());
    }

    match ImageFormat::from_extension(&cfg.texture.target) {
        Some(format) if format.writing_enabled() => Ok(()),
        _ => Err(config_err(format!(
            "[texture].target '{}' is not a supported output image format",
            cfg.texture.target
        ))),
    }
}

fn validate_scene(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scene.extensions.is_empty() {
        return Ok(());
    }
    if cfg.scene.exporter.trim().is_empty() {
        return Err(config_err("[scene].exporter must not be empty"));
    }
    if cfg.scene.timeout_secs == 0 {
        return Err(config_err("[scene].timeout_secs must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_counts(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.workers == 0 {
        return Err(config_err("[watch].workers must be >= 1 (got 0)"));
    }
    if cfg.resync.workers == 0 {
        return Err(config_err("[resync].workers must be >= 1 (got 0)"));
    }
    if cfg.log.recent_size == 0 {
        return Err(config_err("[log].recent_size must be >= 1 (got 0)"));
    }
    Ok(())
}
