// tests/watcher.rs
//
// End-to-end scenarios against the real OS watcher.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use assetmirror::convert::AssetKind;
use assetmirror::errors::AssetMirrorError;
use assetmirror::pipeline::{ConversionPipeline, ConversionResult, JobOutcome, RecentChangeLog};
use assetmirror::watch::{ChangeWatcher, ExcludeMatcher, WatchOptions};
use assetmirror_test_utils::converters::RecordingConverter;
use assetmirror_test_utils::fixtures::{registry_with, write_file, TestRoots};
use assetmirror_test_utils::init_tracing;

/// Time given to the OS watcher to settle after start or mkdir.
const SETTLE: Duration = Duration::from_millis(300);

struct Harness {
    roots: TestRoots,
    converter: Arc<RecordingConverter>,
    log: Arc<RecentChangeLog>,
    watcher: ChangeWatcher,
    results: mpsc::UnboundedReceiver<ConversionResult>,
}

fn harness(exclude: &[&str]) -> Harness {
    init_tracing();
    let roots = TestRoots::new();
    let converter = Arc::new(RecordingConverter::new(AssetKind::Texture, "tga"));
    let log = Arc::new(RecentChangeLog::new(10));
    let pipeline = Arc::new(
        ConversionPipeline::new(
            Arc::new(registry_with(converter.clone(), &["psd"])),
            log.clone(),
        )
        .with_skip_unchanged(true),
    );

    let patterns: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    let options = WatchOptions {
        debounce: Duration::from_millis(100),
        workers: 2,
        exclude: ExcludeMatcher::new(&patterns).unwrap(),
    };

    let (tx, results) = mpsc::unbounded_channel();
    let watcher = ChangeWatcher::new(pipeline, options).with_results(tx);

    Harness {
        roots,
        converter,
        log,
        watcher,
        results,
    }
}

impl Harness {
    fn start(&mut self) {
        self.watcher
            .start(&self.roots.watch, &self.roots.mirror)
            .expect("start watcher");
    }

    /// Wait for the next mirrored path.
    async fn next_mirrored(&mut self) -> std::path::PathBuf {
        loop {
            let result = timeout(Duration::from_secs(10), self.results.recv())
                .await
                .expect("timed out waiting for a conversion")
                .expect("results channel closed");
            if let Ok(JobOutcome::Mirrored(paths)) = result {
                return paths.mirrored;
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_file_is_converted_and_notified_once() {
    let mut h = harness(&[]);
    h.start();
    sleep(SETTLE).await;

    write_file(&h.roots.watch.join("chars/hero.psd"), b"pixels");

    let mirrored = h.next_mirrored().await;
    assert_eq!(mirrored, h.roots.mirrored("chars/hero.tga"));
    assert_eq!(fs::read(&mirrored).unwrap(), b"pixels");

    // Let any trailing events for the same write play out.
    sleep(Duration::from_millis(500)).await;
    assert_eq!(h.log.snapshot(), vec![mirrored]);
    assert_eq!(h.converter.overlaps(), 0);

    h.watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn modified_file_is_mirrored_again() {
    let mut h = harness(&[]);
    let source = h.roots.write("hero.psd", b"v1");
    h.start();
    sleep(SETTLE).await;

    fs::write(&source, b"v2").unwrap();
    let mirrored = h.next_mirrored().await;
    assert_eq!(fs::read(&mirrored).unwrap(), b"v2");

    sleep(SETTLE).await;
    fs::write(&source, b"v3").unwrap();
    let mirrored = h.next_mirrored().await;
    assert_eq!(fs::read(&mirrored).unwrap(), b"v3");

    h.watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn files_in_new_subdirectories_are_picked_up() {
    let mut h = harness(&[]);
    h.start();
    sleep(SETTLE).await;

    fs::create_dir_all(h.roots.watch.join("env/forest")).unwrap();
    sleep(SETTLE).await;
    write_file(&h.roots.watch.join("env/forest/tree.psd"), b"bark");

    let mirrored = h.next_mirrored().await;
    assert_eq!(mirrored, h.roots.mirrored("env/forest/tree.tga"));

    h.watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unrecognized_and_excluded_files_are_ignored() {
    let mut h = harness(&["wip/**"]);
    h.start();
    sleep(SETTLE).await;

    write_file(&h.roots.watch.join("notes.txt"), b"todo");
    write_file(&h.roots.watch.join("sketch.PSD"), b"caps");
    write_file(&h.roots.watch.join("wip/draft.psd"), b"draft");
    write_file(&h.roots.watch.join("final.psd"), b"final");

    // Only the last file qualifies.
    let mirrored = h.next_mirrored().await;
    assert_eq!(mirrored, h.roots.mirrored("final.tga"));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(h.converter.calls(), vec![h.roots.watch.join("final.psd")]);
    assert!(!h.roots.mirrored("wip/draft.tga").exists());

    h.watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_start_is_rejected() {
    let mut h = harness(&[]);
    h.start();
    assert!(h.watcher.is_watching());

    let err = h
        .watcher
        .start(&h.roots.watch, &h.roots.mirror)
        .unwrap_err();
    assert!(matches!(err, AssetMirrorError::AlreadyWatching));
    assert!(h.watcher.is_watching());

    h.watcher.stop().await.unwrap();
    assert!(!h.watcher.is_watching());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_watch_root_is_rejected() {
    let mut h = harness(&[]);
    let missing = h.roots.watch.join("does-not-exist");

    let err = h.watcher.start(&missing, &h.roots.mirror).unwrap_err();
    assert!(matches!(err, AssetMirrorError::ConfigError(_)));
    assert!(!h.watcher.is_watching());

    let err = h.watcher.start("", &h.roots.mirror).unwrap_err();
    assert!(matches!(err, AssetMirrorError::ConfigError(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mirror_root_is_created_on_start() {
    let mut h = harness(&[]);
    assert!(!h.roots.mirror.exists());

    h.start();
    assert!(h.roots.mirror.is_dir());

    h.watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_conversions_after_stop() {
    let mut h = harness(&[]);
    h.start();
    sleep(SETTLE).await;
    h.watcher.stop().await.unwrap();
    assert!(!h.watcher.is_watching());
    assert!(h.watcher.roots().is_none());

    write_file(&h.roots.watch.join("late.psd"), b"late");
    sleep(Duration::from_millis(500)).await;

    assert_eq!(h.converter.call_count(), 0);
    assert!(!h.roots.mirrored("late.tga").exists());

    // Stopping again is a no-op.
    h.watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_can_be_restarted() {
    let mut h = harness(&[]);
    h.start();
    h.watcher.stop().await.unwrap();

    h.start();
    sleep(SETTLE).await;
    write_file(&h.roots.watch.join("again.psd"), b"again");

    let mirrored = h.next_mirrored().await;
    assert_eq!(mirrored, h.roots.mirrored("again.tga"));

    h.watcher.stop().await.unwrap();
}
