// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Scalar quantizer for the 4×4 mark DCT blocks.
//!
//! The step table is a design constant of the watermark format: it must be
//! identical on both sides, so the values here are pinned by a golden test.
//! Steps grow with frequency. The DC term carries the cell's black/white
//! decision and gets the finest step; the high-frequency tail mostly holds
//! cell-edge detail that the b×b averaging discards anyway, so coarse steps
//! there collapse channel noise to zero.

/// Per-position quantization steps, natural (row-major) order.
pub const STEPS: [i32; 16] = [
    16, 16, 20, 24, //
    16, 20, 24, 28, //
    20, 24, 28, 32, //
    24, 28, 32, 40, //
];

/// Divide each coefficient by its step, rounding half away from zero.
pub fn quantize(coeffs: &[i32], out: &mut [i32]) {
    assert_eq!(coeffs.len(), 16);
    assert_eq!(out.len(), 16);
    for i in 0..16 {
        out[i] = (coeffs[i] as f64 / STEPS[i] as f64).round() as i32;
    }
}

/// Multiply each quantized value back by its step.
pub fn dequantize(quantized: &[i32], out: &mut [i32]) {
    assert_eq!(quantized.len(), 16);
    assert_eq!(out.len(), 16);
    for i in 0..16 {
        out[i] = quantized[i] * STEPS[i];
    }
}
