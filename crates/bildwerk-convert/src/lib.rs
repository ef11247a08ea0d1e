// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-convert — The conversion pipeline for Bildwerk.
//
// Provides the EXIF orientation reader (total, never-failing JPEG segment
// scan), the pure transform planner, the re-encode and thumbnail stage, and
// the per-job pipeline that composes them.

pub mod exif;
pub mod pipeline;
pub mod render;
pub mod transform;

pub use exif::read_orientation;
pub use pipeline::convert;
pub use transform::{plan_transform, TransformOp, TransformPlan};
