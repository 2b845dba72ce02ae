// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Zigzag scan order for the 128×128 mark grid.
//!
//! The standard JPEG zigzag scan (alternating diagonal sweeps starting at
//! the top-left corner) extended to a 128-wide square. [`two2one`] linearizes
//! a matrix into scan order, [`one2two`] is its inverse; the pair is a
//! bijection between the grid and a 16384-entry vector.

use std::sync::OnceLock;

use crate::mark::{MARK_AREA, MARK_SIZE};

/// Zigzag scan order for an `n`×`n` grid: entry `t` is the row-major index
/// visited at scan position `t`.
pub fn scan_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n * n);
    let (mut r, mut c) = (0usize, 0usize);
    for _ in 0..n * n {
        order.push(r * n + c);
        if (r + c) % 2 == 0 {
            // sweeping up-right
            if c == n - 1 {
                r += 1;
            } else if r == 0 {
                c += 1;
            } else {
                r -= 1;
                c += 1;
            }
        } else {
            // sweeping down-left
            if r == n - 1 {
                c += 1;
            } else if c == 0 {
                r += 1;
            } else {
                r += 1;
                c -= 1;
            }
        }
    }
    order
}

fn mark_scan() -> &'static [usize] {
    static SCAN: OnceLock<Vec<usize>> = OnceLock::new();
    SCAN.get_or_init(|| scan_order(MARK_SIZE))
}

/// Linearize a 128×128 row-major matrix into zigzag scan order.
pub fn two2one(matrix: &[i32], vector: &mut [i32]) {
    assert_eq!(matrix.len(), MARK_AREA);
    assert!(vector.len() >= MARK_AREA);
    for (t, &idx) in mark_scan().iter().enumerate() {
        vector[t] = matrix[idx];
    }
}

/// Inverse of [`two2one`]: scatter a zigzag-ordered vector back to the grid.
pub fn one2two(vector: &[i32], matrix: &mut [i32]) {
    assert!(vector.len() >= MARK_AREA);
    assert_eq!(matrix.len(), MARK_AREA);
    for (t, &idx) in mark_scan().iter().enumerate() {
        matrix[idx] = vector[t];
    }
}
