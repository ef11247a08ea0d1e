// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Message contract between the dispatcher and the background workers.
// Buffers travel by move: the submitting side gives up its byte buffer at
// dispatch, and output/thumbnail buffers come back the same way inside the
// outcome. No buffer is ever reachable from two tasks at once.

use bildwerk_core::{ConversionOutcome, ConvertOptions, JobId};
use serde::{Deserialize, Serialize};

/// Dispatch message carrying one conversion job to a worker.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub id: JobId,
    /// Raw encoded image bytes, moved in from the submitted `SourceFile`.
    pub buffer: Vec<u8>,
    pub original_name: String,
    pub options: ConvertOptions,
}

/// Completion message sent back by a worker, tagged with the job id so the
/// dispatcher can correlate it with the pending caller.
#[derive(Debug, Serialize, Deserialize)]
pub enum WorkerReply {
    Done {
        id: JobId,
        outcome: ConversionOutcome,
    },
    Error {
        id: JobId,
        message: String,
        original_name: String,
    },
}

impl WorkerReply {
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Done { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

/// A reply paired with the slot index of the worker that produced it, so the
/// dispatcher can mark that slot idle again.
#[derive(Debug)]
pub struct WorkerReport {
    pub worker: usize,
    pub reply: WorkerReply,
}
