// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-job conversion pipeline: orientation read → transform plan → render →
// thumbnail. Stateless between calls; this is the function each pool worker
// runs for every dispatched job.

use std::time::Instant;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::{AppConfig, ConversionOutcome, ConvertOptions};
use tracing::{debug, info, instrument};

use crate::exif;
use crate::render;
use crate::transform;

/// Convert one encoded image buffer into the requested output format.
///
/// When `options.autorotate` is set, the EXIF orientation is read from the
/// raw buffer and the pixels are uprighted before encoding. Metadata is
/// stripped unconditionally: the output is encoded from raw pixels, so
/// nothing from the input container carries over regardless of
/// `options.strip_metadata`.
#[instrument(skip(buffer, config), fields(name = original_name, in_bytes = buffer.len()))]
pub fn convert(
    buffer: &[u8],
    original_name: &str,
    options: &ConvertOptions,
    config: &AppConfig,
) -> Result<ConversionOutcome> {
    let start = Instant::now();

    let orientation = if options.autorotate {
        exif::read_orientation(buffer)
    } else {
        None
    };

    let decoded = image::load_from_memory(buffer)
        .map_err(|err| BildwerkError::Decode(format!("{original_name}: {err}")))?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        orientation = orientation.map(|o| o.code()).unwrap_or(1),
        "image decoded"
    );

    let plan = transform::plan_transform(decoded.width(), decoded.height(), orientation);
    let upright = render::apply_plan(decoded, &plan);

    let output = render::encode(
        &upright,
        options.format,
        options.quality,
        config.default_quality,
    )?;
    let thumbnail = render::thumbnail(
        &upright,
        config.thumbnail_max_dim,
        config.thumbnail_quality,
    )?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        out_bytes = output.len(),
        thumb_bytes = thumbnail.len(),
        elapsed_ms,
        "conversion complete"
    );

    Ok(ConversionOutcome {
        width: upright.width(),
        height: upright.height(),
        original_size: buffer.len(),
        output_size: output.len(),
        orientation: orientation.map(|o| o.code()).unwrap_or(1),
        original_name: original_name.to_string(),
        elapsed_ms,
        output,
        thumbnail,
    })
}
