// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation transform planning.
//
// Pure dimension and operation planning — no pixel work happens here. The
// original canvas implementation paired every rotation/flip with a translate
// to re-anchor content at the top-left origin; operating on whole pixel
// buffers makes that compensation unnecessary while keeping the visual
// semantics of the canonical EXIF orientation table.

use bildwerk_core::ExifOrientation;
use serde::{Deserialize, Serialize};

/// One primitive pixel-buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformOp {
    FlipHorizontal,
    FlipVertical,
    Rotate90Cw,
    Rotate180,
    Rotate90Ccw,
}

/// Output dimensions plus the ordered operations that make an image upright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformPlan {
    pub out_width: u32,
    pub out_height: u32,
    pub ops: Vec<TransformOp>,
}

impl TransformPlan {
    /// Whether the plan leaves the pixels untouched.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Compute the plan that uprights an image of the given source dimensions.
///
/// `None` and code 1 yield the identity plan. Codes 2-4 keep the dimensions;
/// codes 5-8 swap them. Zero-area sources are degenerate but well-defined:
/// the output dimensions are the (possibly swapped) zeros.
pub fn plan_transform(
    width: u32,
    height: u32,
    orientation: Option<ExifOrientation>,
) -> TransformPlan {
    let ops = match orientation {
        None | Some(ExifOrientation::Normal) => vec![],
        Some(ExifOrientation::FlipHorizontal) => vec![TransformOp::FlipHorizontal],
        Some(ExifOrientation::Rotate180) => vec![TransformOp::Rotate180],
        Some(ExifOrientation::FlipVertical) => vec![TransformOp::FlipVertical],
        Some(ExifOrientation::Transpose) => {
            vec![TransformOp::Rotate90Cw, TransformOp::FlipHorizontal]
        }
        Some(ExifOrientation::Rotate90Cw) => vec![TransformOp::Rotate90Cw],
        Some(ExifOrientation::Transverse) => {
            vec![TransformOp::Rotate90Ccw, TransformOp::FlipHorizontal]
        }
        Some(ExifOrientation::Rotate90Ccw) => vec![TransformOp::Rotate90Ccw],
    };

    let swap = orientation.is_some_and(|o| o.swaps_dimensions());
    let (out_width, out_height) = if swap { (height, width) } else { (width, height) };

    TransformPlan {
        out_width,
        out_height,
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_orientation_is_identity() {
        let plan = plan_transform(640, 480, None);
        assert!(plan.is_identity());
        assert_eq!((plan.out_width, plan.out_height), (640, 480));
    }

    #[test]
    fn code_one_is_identity() {
        let plan = plan_transform(640, 480, Some(ExifOrientation::Normal));
        assert!(plan.is_identity());
    }

    #[test]
    fn codes_one_to_four_keep_dimensions() {
        for code in 1..=4u16 {
            let orientation = ExifOrientation::from_code(code);
            let plan = plan_transform(100, 200, orientation);
            assert_eq!((plan.out_width, plan.out_height), (100, 200), "code {code}");
        }
    }

    #[test]
    fn codes_five_to_eight_swap_dimensions() {
        for code in 5..=8u16 {
            let orientation = ExifOrientation::from_code(code);
            let plan = plan_transform(100, 200, orientation);
            assert_eq!((plan.out_width, plan.out_height), (200, 100), "code {code}");
        }
    }

    #[test]
    fn simple_codes_apply_exactly_one_operation() {
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::FlipHorizontal)).ops,
            vec![TransformOp::FlipHorizontal]
        );
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::Rotate180)).ops,
            vec![TransformOp::Rotate180]
        );
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::FlipVertical)).ops,
            vec![TransformOp::FlipVertical]
        );
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::Rotate90Cw)).ops,
            vec![TransformOp::Rotate90Cw]
        );
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::Rotate90Ccw)).ops,
            vec![TransformOp::Rotate90Ccw]
        );
    }

    #[test]
    fn mirrored_quarter_turns_rotate_then_flip() {
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::Transpose)).ops,
            vec![TransformOp::Rotate90Cw, TransformOp::FlipHorizontal]
        );
        assert_eq!(
            plan_transform(10, 10, Some(ExifOrientation::Transverse)).ops,
            vec![TransformOp::Rotate90Ccw, TransformOp::FlipHorizontal]
        );
    }

    #[test]
    fn zero_area_sources_do_not_panic() {
        let plan = plan_transform(0, 0, Some(ExifOrientation::Rotate90Cw));
        assert_eq!((plan.out_width, plan.out_height), (0, 0));

        let plan = plan_transform(0, 15, Some(ExifOrientation::Rotate90Cw));
        assert_eq!((plan.out_width, plan.out_height), (15, 0));

        let plan = plan_transform(0, 15, Some(ExifOrientation::FlipVertical));
        assert_eq!((plan.out_width, plan.out_height), (0, 15));
    }
}
