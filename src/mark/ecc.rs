// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Reed-Solomon error correction over GF(2^8).
//!
//! Systematic RS with the JPEG-style primitive polynomial 0x11D
//! (x^8+x^4+x^3+x^2+1), parameterized by the number of parity symbols.
//! The watermark codeword is a single short block (a shortened RS(255, k)
//! code), so there is no multi-block splitting: [`encode`] appends `parity`
//! symbols, [`decode`] corrects up to `parity / 2` symbol errors via
//! Berlekamp-Massey, Chien search and the Forney algorithm.
//!
//! Bit-level wrappers ([`encode_bits`] / [`decode_bits`]) pack the codec's
//! MSB-first bit buffers into whole bytes; the codeword layout is
//! `[data || parity]`.

use std::sync::OnceLock;

use crate::mark::bits::BitBuffer;
use crate::mark::error::WatermarkError;

/// Primitive polynomial for GF(2^8): x^8 + x^4 + x^3 + x^2 + 1.
const PRIM_POLY: u16 = 0x11D;

/// Symbols per full RS block; shortened blocks behave like this length
/// with leading zero data symbols.
const BLOCK_MAX: usize = 255;

struct GfTables {
    /// α^i for i in 0..510 (doubled for mod-free products).
    exp: [u8; 510],
    /// log_α(x) for x in 1..=255; log[0] is unused.
    log: [u8; 256],
}

fn gf_tables() -> &'static GfTables {
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 510];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            exp[i + 255] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIM_POLY;
            }
        }
        GfTables { exp, log }
    })
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = gf_tables();
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

/// Multiplicative inverse; `a` must be non-zero.
fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "zero has no inverse in GF(2^8)");
    let t = gf_tables();
    t.exp[255 - t.log[a as usize] as usize]
}

/// α^e for e in 0..255.
fn alpha_pow(e: usize) -> u8 {
    gf_tables().exp[e % 255]
}

/// α^-e for e in 0..255.
fn alpha_pow_neg(e: usize) -> u8 {
    gf_tables().exp[(255 - e % 255) % 255]
}

/// Evaluate an ascending-power polynomial at `x`.
fn eval_poly(poly: &[u8], x: u8) -> u8 {
    let mut acc = 0u8;
    for &c in poly.iter().rev() {
        acc = gf_mul(acc, x) ^ c;
    }
    acc
}

/// Generator polynomial g(x) = Π_{i=0}^{parity-1} (x - α^i), ascending
/// power order, `g[parity] == 1`.
fn generator_poly(parity: usize) -> Vec<u8> {
    let mut g = vec![0u8; parity + 1];
    g[0] = 1;
    for i in 0..parity {
        let root = alpha_pow(i);
        // g *= (x + root): shift up by one and add root * g
        for j in (1..=i + 1).rev() {
            g[j] = g[j - 1] ^ gf_mul(root, g[j]);
        }
        g[0] = gf_mul(root, g[0]);
    }
    g
}

/// Systematic RS encode: returns `data` followed by `parity` parity symbols.
///
/// # Panics
/// Panics if `data.len() + parity` exceeds 255 (one GF(2^8) block).
pub fn encode(data: &[u8], parity: usize) -> Vec<u8> {
    assert!(
        data.len() + parity <= BLOCK_MAX,
        "codeword of {} symbols exceeds {BLOCK_MAX}",
        data.len() + parity
    );
    if parity == 0 {
        return data.to_vec();
    }

    let g = generator_poly(parity);

    // Remainder of data(x) * x^parity mod g(x), computed as an LFSR.
    let mut rem = vec![0u8; parity];
    for &byte in data {
        let coef = byte ^ rem[0];
        rem.rotate_left(1);
        rem[parity - 1] = 0;
        if coef != 0 {
            for (j, r) in rem.iter_mut().enumerate() {
                *r ^= gf_mul(coef, g[parity - 1 - j]);
            }
        }
    }

    let mut codeword = Vec::with_capacity(data.len() + parity);
    codeword.extend_from_slice(data);
    codeword.extend_from_slice(&rem);
    codeword
}

/// Syndromes S_i = r(α^i) for i in 0..parity.
///
/// The received block is the tail of a full 255-symbol codeword whose
/// leading symbols are zero, so evaluating over the shortened block gives
/// the same syndromes as the padded one.
fn syndromes(received: &[u8], parity: usize) -> Vec<u8> {
    let mut s = vec![0u8; parity];
    for (i, syn) in s.iter_mut().enumerate() {
        let x = alpha_pow(i);
        let mut acc = 0u8;
        for &r in received {
            acc = gf_mul(acc, x) ^ r;
        }
        *syn = acc;
    }
    s
}

/// Berlekamp-Massey: error locator σ(x) in ascending power, σ(0) = 1.
fn error_locator(synd: &[u8]) -> Vec<u8> {
    let mut sigma = vec![1u8];
    let mut prev = vec![1u8];
    let mut degree = 0usize;
    let mut gap = 1usize;
    let mut last_delta = 1u8;

    for i in 0..synd.len() {
        let mut delta = synd[i];
        for j in 1..sigma.len().min(i + 1) {
            delta ^= gf_mul(sigma[j], synd[i - j]);
        }
        if delta == 0 {
            gap += 1;
            continue;
        }

        let grow = 2 * degree <= i;
        let snapshot = if grow { Some(sigma.clone()) } else { None };

        // sigma -= (delta / last_delta) * x^gap * prev
        let coef = gf_mul(delta, gf_inv(last_delta));
        if sigma.len() < prev.len() + gap {
            sigma.resize(prev.len() + gap, 0);
        }
        for (j, &p) in prev.iter().enumerate() {
            sigma[j + gap] ^= gf_mul(coef, p);
        }

        if let Some(old) = snapshot {
            degree = i + 1 - degree;
            prev = old;
            last_delta = delta;
            gap = 1;
        } else {
            gap += 1;
        }
    }

    while sigma.len() > 1 && sigma[sigma.len() - 1] == 0 {
        sigma.pop();
    }
    sigma
}

/// Chien search over the transmitted positions only.
///
/// An error at array index `j` of an `n`-symbol block sits at the
/// coefficient of x^(n-1-j), i.e. field location X = α^(n-1-j); σ has a
/// root at X^-1. Returns `None` when the root count does not match the
/// locator degree (more errors than the code can resolve).
fn error_positions(sigma: &[u8], n: usize) -> Option<Vec<usize>> {
    let expected = sigma.len() - 1;
    let mut positions = Vec::with_capacity(expected);
    for j in 0..n {
        let x_inv = alpha_pow_neg(n - 1 - j);
        if eval_poly(sigma, x_inv) == 0 {
            positions.push(j);
        }
    }
    (positions.len() == expected).then_some(positions)
}

/// Forney algorithm (first consecutive root α^0): error magnitude at each
/// located position is `X · Ω(X^-1) / σ'(X^-1)`.
fn error_magnitudes(sigma: &[u8], synd: &[u8], positions: &[usize], n: usize) -> Vec<u8> {
    let parity = synd.len();

    // Ω(x) = S(x) · σ(x) mod x^parity
    let mut omega = vec![0u8; parity];
    for (i, &sc) in sigma.iter().enumerate() {
        for (j, &sy) in synd.iter().enumerate() {
            if i + j < parity {
                omega[i + j] ^= gf_mul(sc, sy);
            }
        }
    }

    // Formal derivative over GF(2^m): even-power terms vanish.
    let mut sigma_prime = vec![0u8; sigma.len().saturating_sub(1)];
    for j in (1..sigma.len()).step_by(2) {
        sigma_prime[j - 1] = sigma[j];
    }

    positions
        .iter()
        .map(|&j| {
            let x = alpha_pow(n - 1 - j);
            let x_inv = alpha_pow_neg(n - 1 - j);
            let denom = eval_poly(&sigma_prime, x_inv);
            if denom == 0 {
                return 0;
            }
            gf_mul(x, gf_mul(eval_poly(&omega, x_inv), gf_inv(denom)))
        })
        .collect()
}

/// RS decode: corrects up to `parity / 2` symbol errors in place and
/// returns the data portion (parity stripped) plus the number of symbols
/// corrected.
///
/// A block of exactly `parity` symbols is a zero-length-data shortened
/// codeword: it still gets the syndrome check (and correction), and the
/// data portion comes back empty.
///
/// # Errors
/// [`WatermarkError::Uncorrectable`] when the error pattern exceeds the
/// correction capacity.
pub fn decode(received: &[u8], parity: usize) -> Result<(Vec<u8>, usize), WatermarkError> {
    assert!(
        received.len() <= BLOCK_MAX && received.len() >= parity,
        "received block of {} symbols invalid for parity {parity}",
        received.len()
    );
    let data_len = received.len() - parity;
    if parity == 0 {
        return Ok((received.to_vec(), 0));
    }

    let synd = syndromes(received, parity);
    if synd.iter().all(|&s| s == 0) {
        return Ok((received[..data_len].to_vec(), 0));
    }

    let sigma = error_locator(&synd);
    let num_errors = sigma.len() - 1;
    if num_errors == 0 || num_errors > parity / 2 {
        return Err(WatermarkError::Uncorrectable);
    }

    let positions =
        error_positions(&sigma, received.len()).ok_or(WatermarkError::Uncorrectable)?;
    let magnitudes = error_magnitudes(&sigma, &synd, &positions, received.len());

    let mut corrected = received.to_vec();
    for (&j, &e) in positions.iter().zip(magnitudes.iter()) {
        corrected[j] ^= e;
    }

    if syndromes(&corrected, parity).iter().any(|&s| s != 0) {
        return Err(WatermarkError::Uncorrectable);
    }

    corrected.truncate(data_len);
    Ok((corrected, num_errors))
}

/// RS-encode a byte-aligned bit buffer; output grows by `parity * 8` bits.
pub fn encode_bits(bits: &BitBuffer, parity: usize) -> BitBuffer {
    BitBuffer::from_bytes(&encode(&bits.to_bytes(), parity))
}

/// RS-decode a byte-aligned bit buffer; returns the data bits and the
/// number of symbols corrected.
pub fn decode_bits(bits: &BitBuffer, parity: usize) -> Result<(BitBuffer, usize), WatermarkError> {
    let (data, corrected) = decode(&bits.to_bytes(), parity)?;
    Ok((BitBuffer::from_bytes(&data), corrected))
}
