// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Square 2D type-II DCT with integer input and output.
//!
//! The orthonormal normalization is used: each dimension scales by
//! `sqrt(2/N)` with the `1/sqrt(2)` correction on the DC row/column, so the
//! forward and inverse transforms are transposes of one another and
//! `inverse(forward(x))` reproduces `x` within integer-rounding error.
//! The cover pipeline uses N=8, the mark pipeline N=4; both share one
//! implementation with a precomputed basis matrix.

use std::sync::OnceLock;

/// Separable N×N DCT-II over integer blocks.
///
/// Blocks are row-major slices of length `N*N`. Coefficients are rounded to
/// the nearest integer on output; there is no level shift and no
/// quantization here.
#[derive(Debug)]
pub struct Dct {
    n: usize,
    /// `basis[u * n + x] = c(u) * sqrt(2/N) * cos((2x+1) u π / 2N)`.
    basis: Vec<f64>,
}

impl Dct {
    pub fn new(n: usize) -> Self {
        assert!(n > 0);
        let scale = (2.0 / n as f64).sqrt();
        let mut basis = vec![0.0f64; n * n];
        for u in 0..n {
            let cu = if u == 0 { std::f64::consts::FRAC_1_SQRT_2 } else { 1.0 };
            for x in 0..n {
                let angle = (2 * x + 1) as f64 * u as f64 * std::f64::consts::PI
                    / (2.0 * n as f64);
                basis[u * n + x] = cu * scale * angle.cos();
            }
        }
        Self { n, basis }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward DCT-II: `coeffs = B · block · Bᵀ`, rounded to integers.
    pub fn forward(&self, block: &[i32], coeffs: &mut [i32]) {
        self.transform(block, coeffs, false);
    }

    /// Inverse DCT (DCT-III): `block = Bᵀ · coeffs · B`, rounded to integers.
    pub fn inverse(&self, coeffs: &[i32], block: &mut [i32]) {
        self.transform(coeffs, block, true);
    }

    fn transform(&self, input: &[i32], output: &mut [i32], inverse: bool) {
        let n = self.n;
        assert_eq!(input.len(), n * n, "input is not an {n}×{n} block");
        assert_eq!(output.len(), n * n, "output is not an {n}×{n} block");

        // basis(u, x) for forward, basis(x, u) for inverse
        let b = |u: usize, x: usize| {
            if inverse {
                self.basis[x * n + u]
            } else {
                self.basis[u * n + x]
            }
        };

        // Pass 1: transform each row.
        let mut temp = vec![0.0f64; n * n];
        for row in 0..n {
            for u in 0..n {
                let mut sum = 0.0;
                for x in 0..n {
                    sum += input[row * n + x] as f64 * b(u, x);
                }
                temp[row * n + u] = sum;
            }
        }

        // Pass 2: transform each column.
        for col in 0..n {
            for u in 0..n {
                let mut sum = 0.0;
                for y in 0..n {
                    sum += temp[y * n + col] * b(u, y);
                }
                output[u * n + col] = sum.round() as i32;
            }
        }
    }
}

/// Shared 8×8 transform for the cover plane.
pub fn dct8() -> &'static Dct {
    static DCT8: OnceLock<Dct> = OnceLock::new();
    DCT8.get_or_init(|| Dct::new(8))
}

/// Shared 4×4 transform for the mark.
pub fn dct4() -> &'static Dct {
    static DCT4: OnceLock<Dct> = OnceLock::new();
    DCT4.get_or_init(|| Dct::new(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::permute::Lcg;

    #[test]
    fn dc_of_constant_block() {
        // All-128 8×8 block: DC = 128 * 8, every AC coefficient zero.
        let block = [128i32; 64];
        let mut coeffs = [0i32; 64];
        dct8().forward(&block, &mut coeffs);
        assert_eq!(coeffs[0], 1024);
        assert!(coeffs[1..].iter().all(|&c| c == 0));

        // 4×4: DC = sum / 4 = 255 * 16 / 4.
        let block = [255i32; 16];
        let mut coeffs = [0i32; 16];
        dct4().forward(&block, &mut coeffs);
        assert_eq!(coeffs[0], 1020);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn constant_block_round_trips_exactly() {
        for v in [0, 1, 127, 255] {
            let block = [v; 64];
            let mut coeffs = [0i32; 64];
            let mut back = [0i32; 64];
            dct8().forward(&block, &mut coeffs);
            dct8().inverse(&coeffs, &mut back);
            assert_eq!(back, block, "v={v}");
        }
    }

    #[test]
    fn random_blocks_round_trip_within_one() {
        let mut rng = Lcg::new(7);
        for size in [4usize, 8] {
            let dct = Dct::new(size);
            for _ in 0..64 {
                let block: Vec<i32> = (0..size * size).map(|_| rng.next_int(256)).collect();
                let mut coeffs = vec![0i32; size * size];
                let mut back = vec![0i32; size * size];
                dct.forward(&block, &mut coeffs);
                dct.inverse(&coeffs, &mut back);
                for (a, b) in block.iter().zip(back.iter()) {
                    assert!((a - b).abs() <= 1, "N={size}: {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn forward_matches_direct_definition() {
        // Spot-check one coefficient against the textbook double sum.
        let mut rng = Lcg::new(3);
        let block: Vec<i32> = (0..16).map(|_| rng.next_int(256)).collect();
        let mut coeffs = [0i32; 16];
        dct4().forward(&block, &mut coeffs);

        let (u, v) = (1usize, 2usize);
        let scale = (2.0f64 / 4.0).sqrt();
        let mut sum = 0.0;
        for x in 0..4 {
            for y in 0..4 {
                sum += block[x * 4 + y] as f64
                    * ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 8.0).cos()
                    * ((2 * y + 1) as f64 * v as f64 * std::f64::consts::PI / 8.0).cos();
            }
        }
        sum *= scale * scale;
        assert_eq!(coeffs[u * 4 + v], sum.round() as i32);
    }

    #[test]
    fn shared_instances_have_right_sizes() {
        assert_eq!(dct8().size(), 8);
        assert_eq!(dct4().size(), 4);
    }
}
