// tests/texture_converter.rs

use std::fs;

use image::{GenericImageView, ImageFormat};

use assetmirror::convert::{AssetKind, Converter, TextureConverter};
use assetmirror::errors::AssetMirrorError;
use assetmirror::pipeline::{ConversionJob, JobOrigin, JobOutcome};
use assetmirror_test_utils::fixtures::{
    recording_pipeline, registry_with, write_png, write_psd, TestRoots,
};
use assetmirror_test_utils::init_tracing;

#[tokio::test]
async fn png_is_reencoded_as_tga() {
    init_tracing();
    let roots = TestRoots::new();
    let source = roots.watch.join("albedo.png");
    write_png(&source, 8, 4);
    let derived = roots.watch.join("albedo.tga");

    let converter = TextureConverter::new("tga");
    assert_eq!(converter.kind(), AssetKind::Texture);
    assert_eq!(converter.target_extension(), "tga");

    let produced = converter.convert(&source, &derived).await.unwrap();
    assert_eq!(produced, derived);

    let bytes = fs::read(&derived).unwrap();
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Tga).unwrap();
    assert_eq!(img.dimensions(), (8, 4));
}

#[tokio::test]
async fn alpha_is_dropped_for_jpeg_targets() {
    let roots = TestRoots::new();
    let source = roots.watch.join("albedo.png");
    write_png(&source, 4, 4);
    let derived = roots.watch.join("albedo.jpg");

    TextureConverter::new("jpg")
        .convert(&source, &derived)
        .await
        .unwrap();

    let img = image::open(&derived).unwrap();
    assert_eq!(img.dimensions(), (4, 4));
    assert!(!img.color().has_alpha());
}

#[tokio::test]
async fn garbage_psd_is_conversion_error() {
    let roots = TestRoots::new();
    let source = roots.write("broken.psd", b"this is not a photoshop file");
    let derived = roots.watch.join("broken.tga");

    let err = TextureConverter::new("tga")
        .convert(&source, &derived)
        .await
        .unwrap_err();

    assert!(matches!(err, AssetMirrorError::ConversionError { .. }));
    assert!(!derived.exists());
}

#[tokio::test]
async fn garbage_raster_is_conversion_error() {
    let roots = TestRoots::new();
    let source = roots.write("broken.png", b"\x00\x01\x02 definitely not a png");
    let derived = roots.watch.join("broken.tga");

    let err = TextureConverter::new("tga")
        .convert(&source, &derived)
        .await
        .unwrap_err();

    assert!(matches!(err, AssetMirrorError::ConversionError { .. }));
    assert!(!derived.exists());
}

#[tokio::test]
async fn unknown_target_format_is_conversion_error() {
    let roots = TestRoots::new();
    let source = roots.watch.join("albedo.png");
    write_png(&source, 2, 2);

    let err = TextureConverter::new("xyz")
        .convert(&source, &roots.watch.join("albedo.xyz"))
        .await
        .unwrap_err();

    assert!(matches!(err, AssetMirrorError::ConversionError { .. }));
}

#[tokio::test]
async fn texture_flows_through_pipeline_into_mirror() {
    let roots = TestRoots::new();
    let source = roots.watch.join("env/sky/clouds.png");
    write_png(&source, 16, 16);

    let (pipeline, log) = recording_pipeline(
        registry_with(std::sync::Arc::new(TextureConverter::new("tga")), &["png"]),
        10,
    );

    let job = ConversionJob::new(&source, roots.session(), AssetKind::Texture, JobOrigin::Resync);
    let outcome = pipeline.process(&job).await.unwrap();

    let mirrored = roots.mirrored("env/sky/clouds.tga");
    assert!(matches!(outcome, JobOutcome::Mirrored(ref p) if p.mirrored == mirrored));
    assert_eq!(
        fs::read(&mirrored).unwrap(),
        fs::read(roots.watch.join("env/sky/clouds.tga")).unwrap()
    );
    assert_eq!(log.snapshot(), vec![mirrored]);
}

#[tokio::test]
async fn photoshop_source_is_mirrored_as_tga() {
    init_tracing();
    let roots = TestRoots::new();
    let source = roots.watch.join("art/hero.psd");
    write_psd(&source, 4, 3);

    let (pipeline, log) = recording_pipeline(
        registry_with(std::sync::Arc::new(TextureConverter::new("tga")), &["psd"]),
        10,
    );

    let job = ConversionJob::new(&source, roots.session(), AssetKind::Texture, JobOrigin::Watch);
    let outcome = pipeline.process(&job).await.unwrap();

    let mirrored = roots.mirrored("art/hero.tga");
    match outcome {
        JobOutcome::Mirrored(paths) => {
            assert_eq!(paths.derived, roots.watch.join("art/hero.tga"));
            assert_eq!(paths.mirrored, mirrored);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let img = image::load_from_memory_with_format(&fs::read(&mirrored).unwrap(), ImageFormat::Tga)
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (4, 3));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 200, 255]);
    assert_eq!(log.snapshot(), vec![mirrored]);
}
