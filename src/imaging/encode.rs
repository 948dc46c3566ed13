//! In-memory encoding and dimension probing, built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Probe (AVIF) | `avif-parse` container metadata |
//! | Probe (others) | `image::ImageReader::into_dimensions` |
//!
//! Encoding always targets a `Vec<u8>`. Callers that persist the result can
//! then tell a codec failure apart from a failing destination.

use super::params::{EncodeFormat, Quality};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// AV1 encoder speed. 6 trades a little size for reasonable throughput.
const AVIF_SPEED: u8 = 6;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
    #[error("{format} encode failed: {source}")]
    Encode {
        format: EncodeFormat,
        source: image::ImageError,
    },
    #[error("Failed to read dimensions: {0}")]
    Probe(String),
}

/// Pixel dimensions of a decoded or encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Encode `image` as `format` and return the encoded bytes.
///
/// `quality` is honored by JPEG and AVIF; PNG and WebP are lossless and
/// ignore it. Pixel layouts the target codec cannot take are converted first
/// (JPEG has no alpha channel, WebP and AVIF only take 8-bit samples).
pub fn encode(
    image: &DynamicImage,
    format: EncodeFormat,
    quality: Quality,
) -> Result<Vec<u8>, ImagingError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ImagingError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }

    let prepared = prepare_for(image, format);
    let mut buffer = Vec::new();
    // Lossy encoders treat 0 as "unset"; the lowest usable setting is 1.
    let lossy_quality = quality.value().max(1);

    let written = match format {
        EncodeFormat::Jpeg => prepared
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, lossy_quality)),
        EncodeFormat::Png => prepared.write_with_encoder(PngEncoder::new(&mut buffer)),
        EncodeFormat::WebP => prepared.write_with_encoder(WebPEncoder::new_lossless(&mut buffer)),
        EncodeFormat::Avif => prepared.write_with_encoder(AvifEncoder::new_with_speed_quality(
            &mut buffer,
            AVIF_SPEED,
            lossy_quality,
        )),
    };
    written.map_err(|source| ImagingError::Encode { format, source })?;

    Ok(buffer)
}

/// Convert to a pixel layout the codec accepts, borrowing when no
/// conversion is needed.
fn prepare_for(image: &DynamicImage, format: EncodeFormat) -> Cow<'_, DynamicImage> {
    match (format, image) {
        (EncodeFormat::Jpeg, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => {
            Cow::Borrowed(image)
        }
        (EncodeFormat::Jpeg, _) => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        (
            EncodeFormat::Png,
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_),
        ) => Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16())),
        (EncodeFormat::Png, _) => Cow::Borrowed(image),
        (
            EncodeFormat::WebP,
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_),
        ) => Cow::Borrowed(image),
        (EncodeFormat::Avif, DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) => {
            Cow::Borrowed(image)
        }
        (EncodeFormat::WebP | EncodeFormat::Avif, _) => {
            if image.color().has_alpha() {
                Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
            } else {
                Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
            }
        }
    }
}

/// Read the pixel dimensions of encoded image bytes without a full decode.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, ImagingError> {
    let format = image::guess_format(bytes)
        .map_err(|e| ImagingError::Probe(format!("Unrecognized image data: {e}")))?;

    // The `avif` feature only brings the encoder; read the container instead.
    if format == ImageFormat::Avif {
        return probe_avif(bytes);
    }

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| ImagingError::Probe(e.to_string()))?;
    Ok(Dimensions { width, height })
}

/// [`probe_dimensions`] for a file on disk.
pub fn probe_file(path: &Path) -> Result<Dimensions, ImagingError> {
    let bytes = std::fs::read(path)?;
    probe_dimensions(&bytes).map_err(|e| match e {
        ImagingError::Probe(msg) => ImagingError::Probe(format!("{}: {msg}", path.display())),
        other => other,
    })
}

fn probe_avif(bytes: &[u8]) -> Result<Dimensions, ImagingError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| ImagingError::Probe(format!("Failed to parse AVIF: {e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| ImagingError::Probe(format!("Failed to read AVIF metadata: {e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}
