// src/lib.rs

pub mod cli;
pub mod config;
pub mod convert;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod scan;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::convert::ConverterRegistry;
use crate::engine::resync;
use crate::pipeline::{ConversionPipeline, NotificationSink, RecentChangeLog, SessionRoots};
use crate::scan::TreeScanner;
use crate::watch::{ChangeWatcher, ExcludeMatcher, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides for the two roots)
/// - converter registry and conversion pipeline
/// - one-shot resync (`--once`, `--resync-on-start`)
/// - the live watcher and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;

    let watch_root = args.watch_root.clone().or_else(|| cfg.paths.watch_root.clone());
    let mirror_root = args.mirror_root.clone().or_else(|| cfg.paths.mirror_root.clone());

    if args.dry_run {
        print_dry_run(&cfg, watch_root.as_deref(), mirror_root.as_deref());
        return Ok(());
    }

    let watch_root = watch_root
        .context("no watch root given (use --watch-root or [paths].watch_root)")?;
    let mirror_root = mirror_root
        .context("no mirror root given (use --mirror-root or [paths].mirror_root)")?;

    let registry = Arc::new(ConverterRegistry::from_config(&cfg));
    debug!(extensions = ?registry.extensions(), "converter registry ready");

    let recent = Arc::new(RecentChangeLog::new(cfg.log.recent_size));
    let sink: Arc<dyn NotificationSink> = {
        let recent = Arc::clone(&recent);
        Arc::new(move |mirrored: &Path| {
            recent.push(mirrored);
            println!("[assetmirror] mirrored {}", mirrored.display());
        })
    };

    let pipeline = Arc::new(
        ConversionPipeline::new(Arc::clone(&registry), sink)
            .with_skip_unchanged(cfg.watch.skip_unchanged),
    );

    if args.once || args.resync_on_start {
        let roots = Arc::new(SessionRoots::prepare(&watch_root, &mirror_root)?);
        let scanner = TreeScanner::new(
            Arc::clone(&registry),
            ExcludeMatcher::new(&cfg.watch.exclude)?,
        );
        let report = resync(Arc::clone(&pipeline), &scanner, roots, cfg.resync.workers).await;

        for failure in &report.failures {
            eprintln!("[assetmirror] failed {failure}");
        }

        if args.once {
            if !report.is_success() {
                bail!(
                    "resync finished with {} failed file(s) out of {}",
                    report.failures.len(),
                    report.total()
                );
            }
            return Ok(());
        }
    }

    let mut watcher = ChangeWatcher::new(Arc::clone(&pipeline), WatchOptions::from_config(&cfg)?);
    watcher.start(watch_root, mirror_root)?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("shutdown requested");

    watcher.stop().await?;
    debug!(recent = ?recent.snapshot(), "recently mirrored");
    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile, watch_root: Option<&Path>, mirror_root: Option<&Path>) {
    let show = |p: Option<&Path>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unset>".to_string())
    };

    println!("assetmirror dry-run");
    println!("  watch_root  = {}", show(watch_root));
    println!("  mirror_root = {}", show(mirror_root));
    println!();

    println!("watch:");
    println!("  debounce_ms    = {}", cfg.watch.debounce_ms);
    println!("  workers        = {}", cfg.watch.workers);
    println!("  skip_unchanged = {}", cfg.watch.skip_unchanged);
    if !cfg.watch.exclude.is_empty() {
        println!("  exclude        = {:?}", cfg.watch.exclude);
    }

    println!("texture:");
    println!("  {:?} -> {}", cfg.texture.extensions, cfg.texture.target);

    println!("scene:");
    println!("  {:?} -> {}", cfg.scene.extensions, cfg.scene.target);
    let mut command: Vec<&str> = vec![cfg.scene.exporter.as_str()];
    command.extend(cfg.scene.exporter_args.iter().map(String::as_str));
    println!("  exporter: {} <source> <output>", command.join(" "));
    println!("  timeout_secs: {}", cfg.scene.timeout_secs);

    println!("resync.workers = {}", cfg.resync.workers);
    println!("log.recent_size = {}", cfg.log.recent_size);

    debug!("dry-run complete (no conversion)");
}
