// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Re-encode and thumbnail stage. Applies a transform plan to decoded pixels,
// encodes the result into the target format, and produces the fixed-format
// preview thumbnail. Encoding always starts from raw pixels, so no metadata
// segment from the input can survive into the output.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::OutputFormat;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};

use crate::transform::{TransformOp, TransformPlan};

/// Apply a transform plan's operations in order, consuming the source image.
///
/// Each primitive produces a freshly allocated buffer; intermediates are
/// dropped as the fold advances.
pub fn apply_plan(image: DynamicImage, plan: &TransformPlan) -> DynamicImage {
    plan.ops.iter().fold(image, |img, op| match op {
        TransformOp::FlipHorizontal => img.fliph(),
        TransformOp::FlipVertical => img.flipv(),
        TransformOp::Rotate90Cw => img.rotate90(),
        TransformOp::Rotate180 => img.rotate180(),
        TransformOp::Rotate90Ccw => img.rotate270(),
    })
}

/// Encode an image into the requested output format.
///
/// `quality` (1-100) applies to JPEG only; `default_quality` fills in when a
/// job did not specify one. The image crate's WebP encoder is lossless, so
/// quality is ignored for WebP as for the other lossless formats.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    quality: Option<u8>,
    default_quality: u8,
) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Jpeg => {
            let quality = quality.unwrap_or(default_quality).clamp(1, 100);
            encode_jpeg(image, quality)?
        }
        OutputFormat::Png => encode_with(image, ImageFormat::Png)?,
        OutputFormat::WebP => encode_with(image, ImageFormat::WebP)?,
        OutputFormat::Gif => encode_with(image, ImageFormat::Gif)?,
        OutputFormat::Bmp => encode_with(image, ImageFormat::Bmp)?,
    };
    debug!(format = format.mime_type(), out_bytes = bytes.len(), "image encoded");
    Ok(bytes)
}

/// Produce the preview thumbnail: longest side capped at `max_dim` preserving
/// aspect ratio, always JPEG at the fixed preview quality, independent of the
/// primary output format.
#[instrument(skip(image), fields(width = image.width(), height = image.height(), max_dim))]
pub fn thumbnail(image: &DynamicImage, max_dim: u32, quality: u8) -> Result<Vec<u8>> {
    let preview = image.thumbnail(max_dim, max_dim);
    debug!(
        thumb_w = preview.width(),
        thumb_h = preview.height(),
        "thumbnail scaled"
    );
    encode_jpeg(&preview, quality.clamp(1, 100))
}

/// JPEG has no alpha channel; flatten to RGB before encoding.
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| BildwerkError::Encode(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}

fn encode_with(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| BildwerkError::Encode(format!("image encoding failed: {err}")))?;
    Ok(buffer)
}
