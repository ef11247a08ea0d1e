// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bildwerk conversion engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// EXIF orientation code (1-8) as defined by the TIFF/EXIF standard.
///
/// Code 1 is the identity. Codes 5-8 involve a quarter-turn rotation and
/// therefore swap the output dimensions relative to the source. An absent or
/// invalid orientation is represented as `Option::<ExifOrientation>::None`
/// throughout the codebase — it is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExifOrientation {
    /// 1 — upright, no transform needed.
    Normal,
    /// 2 — mirrored along the vertical axis.
    FlipHorizontal,
    /// 3 — upside down.
    Rotate180,
    /// 4 — mirrored along the horizontal axis.
    FlipVertical,
    /// 5 — transposed (rotate 90° CW, then mirror horizontally).
    Transpose,
    /// 6 — rotated 90° clockwise.
    Rotate90Cw,
    /// 7 — transversed (rotate 90° CCW, then mirror horizontally).
    Transverse,
    /// 8 — rotated 90° counter-clockwise.
    Rotate90Ccw,
}

impl ExifOrientation {
    /// Map a raw EXIF orientation value to the enum.
    ///
    /// Values outside 1..=8 return `None`, which callers must treat exactly
    /// like a missing orientation tag (identity transform).
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90Cw),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate90Ccw),
            _ => None,
        }
    }

    /// The raw EXIF code (1-8).
    pub fn code(&self) -> u16 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90Cw => 6,
            Self::Transverse => 7,
            Self::Rotate90Ccw => 8,
        }
    }

    /// Whether this orientation swaps width and height (codes 5-8).
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90Cw | Self::Transverse | Self::Rotate90Ccw
        )
    }
}

/// Supported output raster formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
}

impl OutputFormat {
    /// MIME type string used in the dispatch message contract.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Parse a MIME type string back into a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Infer format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// Whether the encoder accepts a quality parameter. Quality is undefined
    /// for lossless formats and is ignored there.
    pub fn supports_quality(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }

    /// Sniff the encoded format from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8]) {
            Some(Self::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    /// Rewrite a filename to carry this format's extension.
    ///
    /// `photo.jpg` becomes `photo.webp`; names without an extension simply
    /// gain one.
    pub fn rename_file(&self, name: &str) -> String {
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => format!("{stem}.{}", self.extension()),
            _ => format!("{name}.{}", self.extension()),
        }
    }
}

/// Per-job conversion options, as supplied by the orchestrating UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Correct orientation from the EXIF tag before encoding.
    pub autorotate: bool,
    /// Accepted for interface compatibility. Re-encoding from raw pixels
    /// always strips metadata, so both values currently behave identically.
    pub strip_metadata: bool,
    /// Target output format.
    pub format: OutputFormat,
    /// Encoder quality (1-100) for lossy formats. `None` applies the
    /// configured default; ignored for lossless formats.
    pub quality: Option<u8>,
}

impl ConvertOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            autorotate: true,
            strip_metadata: true,
            format,
            quality: None,
        }
    }
}

/// One input file: original name plus the raw encoded bytes.
///
/// The byte buffer is moved into the worker pool at submission — the
/// submitting side gives up ownership and cannot read it afterwards.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Lifecycle states of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the FIFO overflow queue.
    Queued,
    /// Sent to a worker, conversion in progress.
    Dispatched,
    /// Finished successfully — outcome delivered.
    Completed,
    /// Finished with an error — failure delivered.
    Failed,
}

/// The result of one successful conversion. Produced exactly once per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Re-encoded image bytes in the requested format.
    pub output: Vec<u8>,
    /// Small preview encoding (JPEG, longest side capped).
    pub thumbnail: Vec<u8>,
    /// Final pixel width after orientation correction.
    pub width: u32,
    /// Final pixel height after orientation correction.
    pub height: u32,
    /// Byte length of the submitted buffer.
    pub original_size: usize,
    /// Byte length of `output`.
    pub output_size: usize,
    /// EXIF orientation code actually applied (1 when absent or autorotate
    /// was off).
    pub orientation: u16,
    /// Name of the submitted file.
    pub original_name: String,
    /// Wall-clock conversion time in milliseconds.
    pub elapsed_ms: u64,
}
