// src/convert/texture.rs

//! In-process texture re-encoding.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use psd::Psd;
use tracing::debug;

use crate::config::TextureSection;
use crate::convert::{AssetKind, ConvertFuture, Converter};
use crate::errors::{AssetMirrorError, Result};
use crate::pipeline::copy::write_atomic;

/// Decodes a texture source and writes it re-encoded in the target format.
///
/// `.psd` sources are flattened through the `psd` crate; every other source
/// extension is decoded by `image` with the format guessed from content.
#[derive(Debug, Clone)]
pub struct TextureConverter {
    target_ext: String,
    format: Option<ImageFormat>,
}

impl TextureConverter {
    pub fn new(target_ext: impl Into<String>) -> Self {
        let target_ext = target_ext.into();
        let format = ImageFormat::from_extension(&target_ext);
        Self { target_ext, format }
    }

    pub fn from_config(section: &TextureSection) -> Self {
        Self::new(section.target.clone())
    }
}

impl Converter for TextureConverter {
    fn kind(&self) -> AssetKind {
        AssetKind::Texture
    }

    fn target_extension(&self) -> &str {
        &self.target_ext
    }

    fn convert<'a>(&'a self, source: &'a Path, derived: &'a Path) -> ConvertFuture<'a> {
        Box::pin(async move {
            let format = self.format.ok_or_else(|| {
                AssetMirrorError::conversion(
                    source,
                    format!("unsupported target image format '{}'", self.target_ext),
                )
            })?;

            let src = source.to_path_buf();
            let dst = derived.to_path_buf();
            tokio::task::spawn_blocking(move || reencode(&src, &dst, format))
                .await
                .map_err(|e| {
                    AssetMirrorError::conversion(source, format!("encoder task failed: {e}"))
                })??;

            Ok(derived.to_path_buf())
        })
    }
}

fn reencode(source: &Path, derived: &Path, format: ImageFormat) -> Result<()> {
    let img = decode(source)?;
    debug!(
        ?source,
        width = img.width(),
        height = img.height(),
        "decoded texture source"
    );

    let img = normalize_for(img, format);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .map_err(|e| AssetMirrorError::conversion(source, format!("encoding failed: {e}")))?;

    write_atomic(derived, buf.get_ref())
}

fn decode(source: &Path) -> Result<DynamicImage> {
    let is_psd = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "psd");

    if is_psd {
        return decode_psd(source);
    }

    ImageReader::open(source)
        .map_err(|e| AssetMirrorError::io(source, e))?
        .with_guessed_format()
        .map_err(|e| AssetMirrorError::io(source, e))?
        .decode()
        .map_err(|e| AssetMirrorError::conversion(source, format!("decoding failed: {e}")))
}

fn decode_psd(source: &Path) -> Result<DynamicImage> {
    let bytes = fs::read(source).map_err(|e| AssetMirrorError::io(source, e))?;
    let psd = Psd::from_bytes(&bytes)
        .map_err(|e| AssetMirrorError::conversion(source, format!("invalid PSD: {e}")))?;

    let (width, height) = (psd.width(), psd.height());
    let rgba = RgbaImage::from_raw(width, height, psd.rgba()).ok_or_else(|| {
        AssetMirrorError::conversion(source, "PSD pixel data does not match its dimensions")
    })?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

/// Bring the pixel layout into one the target encoder accepts.
fn normalize_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Png => img,
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}

