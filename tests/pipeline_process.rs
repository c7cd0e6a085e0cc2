// tests/pipeline_process.rs

use std::fs;
use std::sync::Arc;

use assetmirror::convert::{AssetKind, ConverterRegistry};
use assetmirror::errors::AssetMirrorError;
use assetmirror::pipeline::{
    ConversionJob, ConversionPipeline, JobOrigin, JobOutcome, RecentChangeLog, SkipReason,
};
use assetmirror_test_utils::converters::{FailingConverter, RecordingConverter};
use assetmirror_test_utils::fixtures::{recording_pipeline, registry_with, TestRoots};
use assetmirror_test_utils::init_tracing;

fn texture_recorder() -> Arc<RecordingConverter> {
    Arc::new(RecordingConverter::new(AssetKind::Texture, "tga"))
}

fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn converts_and_mirrors_into_matching_subdirectory() {
    init_tracing();
    let roots = TestRoots::new();
    let source = roots.write("chars/hero/body.psd", b"layered pixels");

    let converter = texture_recorder();
    let (pipeline, log) = recording_pipeline(registry_with(converter.clone(), &["psd"]), 10);

    let job = ConversionJob::new(&source, roots.session(), AssetKind::Texture, JobOrigin::Watch);
    let outcome = pipeline.process(&job).await.unwrap();

    let mirrored = roots.mirrored("chars/hero/body.tga");
    let derived = roots.watch.join("chars/hero/body.tga");
    match outcome {
        JobOutcome::Mirrored(paths) => {
            assert_eq!(paths.mirrored, mirrored);
            assert_eq!(paths.derived, derived);
        }
        other => panic!("expected Mirrored, got {other:?}"),
    }

    assert_eq!(fs::read(&mirrored).unwrap(), b"layered pixels");
    assert_eq!(fs::read(&derived).unwrap(), b"layered pixels");
    assert_eq!(log.snapshot(), vec![mirrored]);
    assert_eq!(converter.calls(), vec![source]);
}

#[tokio::test]
async fn processing_twice_overwrites_without_leftovers() {
    let roots = TestRoots::new();
    let source = roots.write("hero.psd", b"v1");
    let (pipeline, log) = recording_pipeline(registry_with(texture_recorder(), &["psd"]), 10);
    let session = roots.session();

    let job = ConversionJob::new(&source, session.clone(), AssetKind::Texture, JobOrigin::Resync);
    pipeline.process(&job).await.unwrap();

    fs::write(&source, b"v2").unwrap();
    pipeline.process(&job).await.unwrap();

    assert_eq!(fs::read(roots.mirrored("hero.tga")).unwrap(), b"v2");
    // No staging files survive in the destination directory.
    assert_eq!(files_in(&roots.mirror), vec!["hero.tga"]);
    assert_eq!(log.len(), 2);
}

#[tokio::test]
async fn kind_without_converter_is_skipped_without_side_effects() {
    let roots = TestRoots::new();
    let source = roots.write("level.ma", b"scene");
    let converter = texture_recorder();
    let (pipeline, log) = recording_pipeline(registry_with(converter.clone(), &["psd"]), 10);

    let job = ConversionJob::new(&source, roots.session(), AssetKind::Scene, JobOrigin::Watch);
    let outcome = pipeline.process(&job).await.unwrap();

    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::Unrecognized));
    assert!(files_in(&roots.mirror).is_empty());
    assert!(!roots.watch.join("level.fbx").exists());
    assert!(log.is_empty());
    assert_eq!(converter.call_count(), 0);
}

#[tokio::test]
async fn unrecognized_extension_never_becomes_a_job() {
    let roots = TestRoots::new();
    let source = roots.write("notes.txt", b"hello");
    let (pipeline, _log) = recording_pipeline(registry_with(texture_recorder(), &["psd"]), 10);

    let job = ConversionJob::classify(pipeline.registry(), &source, &roots.session(), JobOrigin::Watch);
    assert!(job.is_none());
}

#[tokio::test]
async fn converter_failure_leaves_mirror_untouched_and_pipeline_usable() {
    init_tracing();
    let roots = TestRoots::new();
    let broken = roots.write("props/crate.ma", b"scene");
    let fine = roots.write("props/crate.psd", b"texture");

    let failing = Arc::new(FailingConverter::new(AssetKind::Scene, "fbx"));
    let mut registry = ConverterRegistry::new();
    registry.register(failing.clone(), ["ma"]);
    registry.register(texture_recorder(), ["psd"]);
    let (pipeline, log) = recording_pipeline(registry, 10);
    let session = roots.session();

    let job = ConversionJob::new(&broken, session.clone(), AssetKind::Scene, JobOrigin::Watch);
    let failure = pipeline.process(&job).await.unwrap_err();

    assert_eq!(failure.source_path, broken);
    assert!(matches!(failure.error, AssetMirrorError::ConversionError { .. }));
    assert!(!roots.mirrored("props/crate.fbx").exists());
    assert!(log.is_empty());
    assert_eq!(failing.call_count(), 1);

    let job = ConversionJob::new(&fine, session, AssetKind::Texture, JobOrigin::Watch);
    pipeline.process(&job).await.unwrap();
    assert_eq!(log.snapshot(), vec![roots.mirrored("props/crate.tga")]);
}

#[tokio::test]
async fn source_outside_watch_root_is_path_error() {
    let roots = TestRoots::new();
    let outside_dir = tempfile::tempdir().unwrap();
    let outside = outside_dir.path().join("stray.psd");
    fs::write(&outside, b"x").unwrap();

    let converter = texture_recorder();
    let (pipeline, _log) = recording_pipeline(registry_with(converter.clone(), &["psd"]), 10);

    let job = ConversionJob::new(&outside, roots.session(), AssetKind::Texture, JobOrigin::Watch);
    let failure = pipeline.process(&job).await.unwrap_err();

    assert!(matches!(failure.error, AssetMirrorError::PathError { .. }));
    assert_eq!(converter.call_count(), 0);
}

#[tokio::test]
async fn unchanged_watch_events_are_skipped() {
    let roots = TestRoots::new();
    let source = roots.write("hero.psd", b"same");
    let converter = texture_recorder();
    let log = Arc::new(RecentChangeLog::new(10));
    let pipeline = ConversionPipeline::new(
        Arc::new(registry_with(converter.clone(), &["psd"])),
        log.clone(),
    )
    .with_skip_unchanged(true);
    let session = roots.session();

    let watch_job = ConversionJob::new(&source, session.clone(), AssetKind::Texture, JobOrigin::Watch);
    assert!(matches!(
        pipeline.process(&watch_job).await.unwrap(),
        JobOutcome::Mirrored(_)
    ));
    assert_eq!(
        pipeline.process(&watch_job).await.unwrap(),
        JobOutcome::Skipped(SkipReason::Unchanged)
    );
    assert_eq!(converter.call_count(), 1);

    // Resync always re-converts.
    let resync_job = ConversionJob::new(&source, session.clone(), AssetKind::Texture, JobOrigin::Resync);
    assert!(matches!(
        pipeline.process(&resync_job).await.unwrap(),
        JobOutcome::Mirrored(_)
    ));
    assert_eq!(converter.call_count(), 2);

    // A missing mirror copy is restored even if the content is the same.
    fs::remove_file(roots.mirrored("hero.tga")).unwrap();
    assert!(matches!(
        pipeline.process(&watch_job).await.unwrap(),
        JobOutcome::Mirrored(_)
    ));

    // New content is converted again.
    fs::write(&source, b"different").unwrap();
    assert!(matches!(
        pipeline.process(&watch_job).await.unwrap(),
        JobOutcome::Mirrored(_)
    ));
    assert_eq!(converter.call_count(), 4);
    assert_eq!(fs::read(roots.mirrored("hero.tga")).unwrap(), b"different");
}

#[tokio::test]
async fn without_skip_unchanged_every_event_converts() {
    let roots = TestRoots::new();
    let source = roots.write("hero.psd", b"same");
    let converter = texture_recorder();
    let (pipeline, _log) = recording_pipeline(registry_with(converter.clone(), &["psd"]), 10);

    let job = ConversionJob::new(&source, roots.session(), AssetKind::Texture, JobOrigin::Watch);
    pipeline.process(&job).await.unwrap();
    pipeline.process(&job).await.unwrap();

    assert_eq!(converter.call_count(), 2);
}
