// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use thiserror::Error;

/// Top-level error type for all Bildwerk operations.
///
/// Note that a malformed or missing EXIF segment is deliberately NOT an error
/// anywhere in this taxonomy: orientation parse failures are recovered
/// internally and map to "no orientation" (see `bildwerk-convert::exif`).
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Conversion errors --
    #[error("image decoding failed: {0}")]
    Decode(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    // -- Worker pool errors --
    #[error("conversion job failed: {0}")]
    JobFailed(String),

    #[error("worker pool unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("job {job_id} timed out after {seconds}s")]
    Timeout { job_id: String, seconds: u64 },

    // -- Config / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;
