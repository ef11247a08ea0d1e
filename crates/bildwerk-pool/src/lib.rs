// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-pool — Bounded background worker pool for Bildwerk conversions.
//
// A fixed-size set of long-lived worker tasks runs the conversion pipeline
// off the orchestrating context; a single dispatcher task owns all queue and
// in-flight bookkeeping and correlates completions by job id. Batch helpers
// provide the parallel and strictly-ordered submission policies.

pub mod batch;
pub mod messages;
pub mod pool;

pub use batch::{convert_batch, convert_ordered, BatchFailure, BatchReport};
pub use messages::{ConvertRequest, WorkerReply, WorkerReport};
pub use pool::WorkerPool;
