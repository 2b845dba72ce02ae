// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Error types for the watermark codec.

use core::fmt;

/// Errors that can occur constructing a codec or running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    /// The settings produce a non-positive or unrepresentable capacity,
    /// or the opacity is outside [0, 1].
    InvalidParameters(&'static str),
    /// The cover image has too few 8×8 luminance blocks to carry the mark.
    CoverTooSmall,
    /// Reed-Solomon decoding exceeded its correction capacity.
    Uncorrectable,
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters(reason) => write!(f, "invalid parameters: {reason}"),
            Self::CoverTooSmall => {
                write!(f, "cover image too small (needs 4096 luminance blocks)")
            }
            Self::Uncorrectable => write!(f, "too many errors for Reed-Solomon correction"),
        }
    }
}

impl std::error::Error for WatermarkError {}
