// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! The watermark codec: configuration, embedding and extraction.
//!
//! [`Watermark`] is an immutable configuration handle; every embed or
//! extract call allocates its own working buffers, so one instance can be
//! shared across threads. Embedding drives the full forward pipeline:
//!
//! 1. fit the payload to `max_bits_data`, append Reed-Solomon parity,
//! 2. paint the 128×128 mark bitmap (one b×b cell per bit),
//! 3. scramble the bitmap with the watermark-seed permutation,
//! 4. 4×4 DCT + quantization of the scrambled mark,
//! 5. scramble the quantized coefficients with the embedding-seed
//!    permutation and linearize them in zigzag order,
//! 6. replace the four mid-band coefficients of each 8×8 luminance block
//!    and blend the reconstructed plane back at the configured opacity.
//!
//! Extraction runs the same stages in reverse, thresholding each b×b cell
//! on its mean and finishing with RS correction. Both permutation seeds are
//! required to recover anything; they act as a symmetric key.

use log::debug;

use crate::dsp::dct::{dct4, dct8};
use crate::dsp::{quant, zigzag};
use crate::mark::bits::BitBuffer;
use crate::mark::ecc;
use crate::mark::error::WatermarkError;
use crate::mark::luma::{self, LumaPlane, PixelImage};
use crate::mark::permute::Permutation;
use crate::mark::text;
use crate::mark::{MARK_AREA, MARK_SIZE};

/// Mid-band coefficient slots per 8×8 cover block, (row, col): the
/// JPEG-robust anti-diagonal. Fixed by the format.
const MID_BAND: [(usize, usize); 4] = [(1, 4), (2, 3), (3, 2), (4, 1)];

/// 8×8 cover blocks needed to carry the full mark (4096).
const MARK_BLOCKS: usize = MARK_AREA / MID_BAND.len();

/// Painted value of a set mark cell.
const WHITE: i32 = 255;

/// Cell-mean decision threshold on extraction.
const BIT_THRESHOLD: i64 = 127;

/// Codec settings. Defaults match the Java `dct-watermark` tool, so marks
/// embedded with default settings elsewhere extract with defaults here.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Pixels per bit cell in the 128×128 mark (side of the b×b box).
    pub bit_box_size: usize,
    /// Reed-Solomon parity bytes; 0 disables error correction.
    pub parity_bytes: usize,
    /// Blend factor of the reconstructed luminance, in [0, 1]; 1.0 is the
    /// strongest (and most visible) mark.
    pub opacity: f64,
    /// Seed of the coefficient-spreading permutation.
    pub seed_embedding: u64,
    /// Seed of the mark-bitmap permutation.
    pub seed_watermark: u64,
    /// Emit error-correction diagnostics through `log`.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bit_box_size: 10,
            parity_bytes: 6,
            opacity: 1.0,
            seed_embedding: 24,
            seed_watermark: 19,
            debug: false,
        }
    }
}

/// An immutable watermark codec with validated, precomputed capacities.
#[derive(Debug, Clone)]
pub struct Watermark {
    settings: Settings,
    /// Bit cells per mark row/column: `⌊128 / bit_box_size⌋`.
    cells: usize,
    max_bits_total: usize,
    max_bits_data: usize,
    max_text_len: usize,
}

impl Watermark {
    /// Validate `settings` and derive the capacities.
    ///
    /// # Errors
    /// [`WatermarkError::InvalidParameters`] when the box size is outside
    /// 1..=128, the opacity is outside [0, 1], the parity leaves no payload
    /// capacity, or (with parity enabled) the capacity is not a whole
    /// number of bytes within a single RS block.
    pub fn new(settings: Settings) -> Result<Self, WatermarkError> {
        let b = settings.bit_box_size;
        if b == 0 || b > MARK_SIZE {
            return Err(WatermarkError::InvalidParameters(
                "bit box size must be between 1 and 128",
            ));
        }
        if !settings.opacity.is_finite() || !(0.0..=1.0).contains(&settings.opacity) {
            return Err(WatermarkError::InvalidParameters(
                "opacity must be within [0, 1]",
            ));
        }

        let cells = MARK_SIZE / b;
        let max_bits_total = cells * cells;
        let parity_bits = settings.parity_bytes * 8;
        if parity_bits >= max_bits_total {
            return Err(WatermarkError::InvalidParameters(
                "no payload capacity left after parity",
            ));
        }
        if settings.parity_bytes > 0 {
            if max_bits_total % 8 != 0 {
                return Err(WatermarkError::InvalidParameters(
                    "bit capacity is not byte-aligned, error correction needs whole bytes",
                ));
            }
            if max_bits_total / 8 > 255 {
                return Err(WatermarkError::InvalidParameters(
                    "codeword exceeds a single Reed-Solomon block",
                ));
            }
        }

        let max_bits_data = max_bits_total - parity_bits;
        Ok(Self {
            settings,
            cells,
            max_bits_total,
            max_bits_data,
            max_text_len: max_bits_data / text::BITS_PER_CHAR as usize,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Bits the mark can carry including parity.
    pub fn max_bits_total(&self) -> usize {
        self.max_bits_total
    }

    /// Payload bits excluding parity.
    pub fn max_bits_data(&self) -> usize {
        self.max_bits_data
    }

    /// Characters a text message can carry.
    pub fn max_text_len(&self) -> usize {
        self.max_text_len
    }

    /// Embed a text message. The message is normalized to the 6-bit
    /// alphabet and truncated or space-padded to [`max_text_len`](Self::max_text_len).
    ///
    /// # Errors
    /// [`WatermarkError::CoverTooSmall`] when the image has fewer than 4096
    /// luminance blocks.
    pub fn embed_text(
        &self,
        image: &mut impl PixelImage,
        message: &str,
    ) -> Result<(), WatermarkError> {
        self.embed_data(image, &text::encode(message, self.max_text_len))
    }

    /// Embed a bit payload, truncated or zero-padded to
    /// [`max_bits_data`](Self::max_bits_data).
    ///
    /// # Errors
    /// [`WatermarkError::CoverTooSmall`] when the image has fewer than 4096
    /// luminance blocks.
    pub fn embed_data(
        &self,
        image: &mut impl PixelImage,
        payload: &BitBuffer,
    ) -> Result<(), WatermarkError> {
        let mut plane = LumaPlane::from_image(image);
        self.check_cover(&plane)?;

        // Fit the payload and add error correction.
        let mut bits = payload.slice(0, payload.len().min(self.max_bits_data));
        while bits.len() < self.max_bits_data {
            bits.push(false);
        }
        if self.settings.parity_bytes > 0 {
            bits = ecc::encode_bits(&bits, self.settings.parity_bytes);
        }
        debug_assert_eq!(bits.len(), self.max_bits_total);

        // Paint and scramble the mark bitmap.
        let mark = self.paint_mark(&bits);
        let pi_mark = Permutation::with_seed(self.settings.seed_watermark, MARK_AREA);
        let mut scrambled = vec![0i32; MARK_AREA];
        pi_mark.gather(&mark, &mut scrambled);

        // 4×4 DCT + quantization, then spread the coefficients.
        let quantized = transform_mark(&scrambled);
        let pi_embed = Permutation::with_seed(self.settings.seed_embedding, MARK_AREA);
        let mut spread = vec![0i32; MARK_AREA];
        pi_embed.gather(&quantized, &mut spread);

        let mut carrier = vec![0i32; MARK_AREA];
        zigzag::two2one(&spread, &mut carrier);

        // Write the carrier into the cover mid-band and blend back.
        embed_coefficients(&mut plane, &carrier);
        luma::apply_luminance(image, &plane, self.settings.opacity);
        Ok(())
    }

    /// Extract the payload bits ([`max_bits_data`](Self::max_bits_data) of them).
    ///
    /// # Errors
    /// - [`WatermarkError::CoverTooSmall`] when the image has fewer than
    ///   4096 luminance blocks.
    /// - [`WatermarkError::Uncorrectable`] when the channel damaged more
    ///   than `parity_bytes / 2` codeword bytes.
    pub fn extract_data(&self, image: &impl PixelImage) -> Result<BitBuffer, WatermarkError> {
        let plane = LumaPlane::from_image(image);
        self.check_cover(&plane)?;

        // Read the mid-band carrier and map back to the 128×128 grid.
        let carrier = read_coefficients(&plane);
        let mut spread = vec![0i32; MARK_AREA];
        zigzag::one2two(&carrier, &mut spread);

        // Undo the coefficient spread, then dequantize + inverse DCT.
        let pi_embed = Permutation::with_seed(self.settings.seed_embedding, MARK_AREA);
        let mut quantized = vec![0i32; MARK_AREA];
        pi_embed.scatter(&spread, &mut quantized);
        let scrambled = restore_mark(&quantized);

        // Undo the bitmap scramble and decide each cell.
        let pi_mark = Permutation::with_seed(self.settings.seed_watermark, MARK_AREA);
        let mut mark = vec![0i32; MARK_AREA];
        pi_mark.scatter(&scrambled, &mut mark);
        let raw = self.threshold_cells(&mark);

        if self.settings.parity_bytes == 0 {
            return Ok(raw);
        }
        let (data, corrected) = ecc::decode_bits(&raw, self.settings.parity_bytes)?;
        if self.settings.debug {
            let faulty = (0..self.max_bits_data)
                .filter(|&i| raw.bit(i) != data.bit(i))
                .count();
            debug!(
                "error correction: {faulty} of {} data bits faulty, {corrected} symbols corrected",
                self.max_bits_data
            );
        }
        Ok(data)
    }

    /// Extract a text message, right-trimming the space padding.
    ///
    /// # Errors
    /// Same as [`extract_data`](Self::extract_data).
    pub fn extract_text(&self, image: &impl PixelImage) -> Result<String, WatermarkError> {
        Ok(text::decode(&self.extract_data(image)?, self.max_text_len))
    }

    fn check_cover(&self, plane: &LumaPlane) -> Result<(), WatermarkError> {
        if plane.blocks_wide() * plane.blocks_tall() < MARK_BLOCKS {
            return Err(WatermarkError::CoverTooSmall);
        }
        Ok(())
    }

    /// Paint the mark bitmap: bit `cy·cells + cx` fills the b×b box at
    /// `(cx·b, cy·b)` with white. The strip beyond `cells·b` stays black.
    fn paint_mark(&self, bits: &BitBuffer) -> Vec<i32> {
        let b = self.settings.bit_box_size;
        let mut mark = vec![0i32; MARK_AREA];
        for cy in 0..self.cells {
            for cx in 0..self.cells {
                if !bits.bit(cy * self.cells + cx) {
                    continue;
                }
                for y in cy * b..(cy + 1) * b {
                    mark[y * MARK_SIZE + cx * b..y * MARK_SIZE + (cx + 1) * b].fill(WHITE);
                }
            }
        }
        mark
    }

    /// Decide one bit per cell: mean of the b×b box against the mid level.
    fn threshold_cells(&self, mark: &[i32]) -> BitBuffer {
        let b = self.settings.bit_box_size;
        let mut bits = BitBuffer::with_capacity(self.max_bits_total);
        for cy in 0..self.cells {
            for cx in 0..self.cells {
                let mut sum = 0i64;
                for y in cy * b..(cy + 1) * b {
                    for x in cx * b..(cx + 1) * b {
                        sum += i64::from(mark[y * MARK_SIZE + x]);
                    }
                }
                bits.push(sum / (b * b) as i64 > BIT_THRESHOLD);
            }
        }
        bits
    }
}

/// Forward 4×4 DCT + quantization over every block of a 128×128 mark plane.
fn transform_mark(mark: &[i32]) -> Vec<i32> {
    let dct = dct4();
    let mut out = vec![0i32; MARK_AREA];
    let mut block = [0i32; 16];
    let mut coeffs = [0i32; 16];
    let mut q = [0i32; 16];
    for by in 0..MARK_SIZE / 4 {
        for bx in 0..MARK_SIZE / 4 {
            read_mark_block(mark, bx, by, &mut block);
            dct.forward(&block, &mut coeffs);
            quant::quantize(&coeffs, &mut q);
            write_mark_block(&mut out, bx, by, &q);
        }
    }
    out
}

/// Dequantization + inverse 4×4 DCT, the inverse of [`transform_mark`].
fn restore_mark(quantized: &[i32]) -> Vec<i32> {
    let dct = dct4();
    let mut out = vec![0i32; MARK_AREA];
    let mut q = [0i32; 16];
    let mut coeffs = [0i32; 16];
    let mut block = [0i32; 16];
    for by in 0..MARK_SIZE / 4 {
        for bx in 0..MARK_SIZE / 4 {
            read_mark_block(quantized, bx, by, &mut q);
            quant::dequantize(&q, &mut coeffs);
            dct.inverse(&coeffs, &mut block);
            write_mark_block(&mut out, bx, by, &block);
        }
    }
    out
}

fn read_mark_block(plane: &[i32], bx: usize, by: usize, out: &mut [i32; 16]) {
    for row in 0..4 {
        let base = (by * 4 + row) * MARK_SIZE + bx * 4;
        out[row * 4..row * 4 + 4].copy_from_slice(&plane[base..base + 4]);
    }
}

fn write_mark_block(plane: &mut [i32], bx: usize, by: usize, block: &[i32; 16]) {
    for row in 0..4 {
        let base = (by * 4 + row) * MARK_SIZE + bx * 4;
        plane[base..base + 4].copy_from_slice(&block[row * 4..row * 4 + 4]);
    }
}

/// Replace the mid-band of the first 4096 cover blocks (raster order) with
/// the carrier values, transforming each block forward and back. Blocks
/// past the carrier are left untouched.
fn embed_coefficients(plane: &mut LumaPlane, carrier: &[i32]) {
    let dct = dct8();
    let bw = plane.blocks_wide();
    let mut pixels = [0i32; 64];
    let mut coeffs = [0i32; 64];
    let mut cc = 0;
    for bi in 0..MARK_BLOCKS {
        let (by, bx) = (bi / bw, bi % bw);
        plane.read_block(bx, by, &mut pixels);
        dct.forward(&pixels, &mut coeffs);
        for &(row, col) in &MID_BAND {
            coeffs[row * 8 + col] = carrier[cc];
            cc += 1;
        }
        dct.inverse(&coeffs, &mut pixels);
        plane.write_block(bx, by, &pixels);
    }
}

/// Read the mid-band of the first 4096 cover blocks in embed order.
fn read_coefficients(plane: &LumaPlane) -> Vec<i32> {
    let dct = dct8();
    let bw = plane.blocks_wide();
    let mut pixels = [0i32; 64];
    let mut coeffs = [0i32; 64];
    let mut carrier = Vec::with_capacity(MARK_AREA);
    for bi in 0..MARK_BLOCKS {
        let (by, bx) = (bi / bw, bi % bw);
        plane.read_block(bx, by, &mut pixels);
        dct.forward(&pixels, &mut coeffs);
        for &(row, col) in &MID_BAND {
            carrier.push(coeffs[row * 8 + col]);
        }
    }
    carrier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::permute::Lcg;

    #[test]
    fn default_capacities() {
        let wm = Watermark::new(Settings::default()).unwrap();
        assert_eq!(wm.max_bits_total(), 144); // ⌊128/10⌋² = 12²
        assert_eq!(wm.max_bits_data(), 96); // 144 − 6·8
        assert_eq!(wm.max_text_len(), 16); // ⌊96/6⌋
    }

    #[test]
    fn capacity_formula_holds() {
        for (b, k) in [(8usize, 20usize), (8, 0), (16, 4), (4, 6), (10, 6), (32, 1)] {
            let wm = Watermark::new(Settings {
                bit_box_size: b,
                parity_bytes: k,
                ..Settings::default()
            })
            .unwrap();
            let cells = 128 / b;
            assert_eq!(wm.max_bits_total(), cells * cells, "b={b}");
            assert_eq!(wm.max_bits_data(), cells * cells - 8 * k, "b={b} k={k}");
            assert_eq!(wm.max_text_len(), (cells * cells - 8 * k) / 6, "b={b} k={k}");
        }
    }

    #[test]
    fn rejects_zero_payload_capacity() {
        // Parity eating the whole capacity leaves nothing to embed:
        // b=16 → 64 bits with 8 parity bytes, b=32 → 16 bits with 2.
        for (b, k) in [(16usize, 8usize), (32, 2)] {
            let err = Watermark::new(Settings {
                bit_box_size: b,
                parity_bytes: k,
                ..Settings::default()
            })
            .unwrap_err();
            assert_eq!(
                err,
                WatermarkError::InvalidParameters("no payload capacity left after parity"),
                "b={b} k={k}"
            );
        }
    }

    #[test]
    fn rejects_bad_box_size() {
        for b in [0usize, 129, 1000] {
            let err = Watermark::new(Settings {
                bit_box_size: b,
                ..Settings::default()
            })
            .unwrap_err();
            assert!(matches!(err, WatermarkError::InvalidParameters(_)), "b={b}");
        }
    }

    #[test]
    fn rejects_bad_opacity() {
        for opacity in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let err = Watermark::new(Settings {
                opacity,
                ..Settings::default()
            })
            .unwrap_err();
            assert!(matches!(err, WatermarkError::InvalidParameters(_)));
        }
    }

    #[test]
    fn rejects_parity_overflow() {
        // b=16 → 64 bits total; 9 parity bytes need 72.
        let err = Watermark::new(Settings {
            bit_box_size: 16,
            parity_bytes: 9,
            ..Settings::default()
        })
        .unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidParameters(_)));
    }

    #[test]
    fn rejects_unaligned_capacity_with_parity() {
        // b=9 → 14² = 196 bits, not a whole number of bytes.
        let err = Watermark::new(Settings {
            bit_box_size: 9,
            parity_bytes: 6,
            ..Settings::default()
        })
        .unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidParameters(_)));
        // Without parity the same geometry is fine.
        let wm = Watermark::new(Settings {
            bit_box_size: 9,
            parity_bytes: 0,
            ..Settings::default()
        })
        .unwrap();
        assert_eq!(wm.max_bits_total(), 196);
        assert_eq!(wm.max_bits_data(), 196);
    }

    #[test]
    fn rejects_oversized_codeword() {
        // b=2 → 4096 bits = 512 bytes, past one RS block.
        let err = Watermark::new(Settings {
            bit_box_size: 2,
            parity_bytes: 6,
            ..Settings::default()
        })
        .unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidParameters(_)));
        assert!(Watermark::new(Settings {
            bit_box_size: 2,
            parity_bytes: 0,
            ..Settings::default()
        })
        .is_ok());
    }

    #[test]
    fn paint_threshold_round_trip() {
        let wm = Watermark::new(Settings::default()).unwrap();
        let mut rng = Lcg::new(5);
        let mut bits = BitBuffer::new();
        for _ in 0..wm.max_bits_total() {
            bits.push(rng.next_int(2) == 1);
        }
        let mark = wm.paint_mark(&bits);
        assert_eq!(wm.threshold_cells(&mark), bits);
    }

    #[test]
    fn paint_leaves_remainder_black() {
        let wm = Watermark::new(Settings::default()).unwrap();
        let mut bits = BitBuffer::new();
        for _ in 0..wm.max_bits_total() {
            bits.push(true);
        }
        let mark = wm.paint_mark(&bits);
        // cells·b = 120; rows and columns 120..128 stay black.
        assert_eq!(mark[0], WHITE);
        for y in 0..MARK_SIZE {
            for x in 120..MARK_SIZE {
                assert_eq!(mark[y * MARK_SIZE + x], 0, "({x},{y})");
                assert_eq!(mark[x * MARK_SIZE + y], 0, "({y},{x})");
            }
        }
    }

    #[test]
    fn mark_transform_restores_cells() {
        // A painted mark survives DCT + quantization + inverse at the
        // cell level (pixel values change, cell means do not flip).
        let wm = Watermark::new(Settings::default()).unwrap();
        let mut rng = Lcg::new(11);
        let mut bits = BitBuffer::new();
        for _ in 0..wm.max_bits_total() {
            bits.push(rng.next_int(2) == 1);
        }
        let mark = wm.paint_mark(&bits);
        let restored = restore_mark(&transform_mark(&mark));
        assert_eq!(wm.threshold_cells(&restored), bits);
    }
}
