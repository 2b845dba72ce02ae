// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! 6-bit text codec over the fixed watermark alphabet.
//!
//! Messages are lower-cased, characters outside the alphabet are dropped,
//! and the rest is truncated or space-padded to the codec's text capacity
//! before packing each character as its 6-bit alphabet index. Decoding maps
//! 6-bit groups back and right-trims the space padding.

use std::sync::OnceLock;

use crate::mark::bits::BitBuffer;

/// Valid characters and their order in the 6-bit charset.
///
/// The position of a character is its code; the alphabet has exactly 64
/// entries, so every 6-bit value decodes to a character.
pub const ALPHABET: &str = " abcdefghijklmnopqrstuvwxyz0123456789.-,:/()?!\"'#*+_%$&=<>[];@§\n";

/// Bits per encoded character.
pub const BITS_PER_CHAR: u32 = 6;

fn decode_table() -> &'static [char; 64] {
    static TABLE: OnceLock<[char; 64]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [' '; 64];
        for (i, c) in ALPHABET.chars().enumerate() {
            t[i] = c;
        }
        t
    })
}

/// Code of `c` in the alphabet, or `None` for characters outside it.
fn code_of(c: char) -> Option<u8> {
    ALPHABET.chars().position(|a| a == c).map(|p| p as u8)
}

/// Encode `text` into exactly `max_len * 6` bits.
///
/// Lower-cases, strips characters outside [`ALPHABET`], truncates to
/// `max_len` characters and right-pads with spaces (code 0).
pub fn encode(text: &str, max_len: usize) -> BitBuffer {
    let mut codes: Vec<u8> = text.to_lowercase().chars().filter_map(code_of).collect();
    codes.truncate(max_len);
    codes.resize(max_len, 0); // pad with spaces

    let mut bits = BitBuffer::with_capacity(max_len * BITS_PER_CHAR as usize);
    for code in codes {
        bits.push_value(u64::from(code), BITS_PER_CHAR);
    }
    bits
}

/// Decode `max_len` characters from the front of `bits`, trimming the
/// trailing space padding.
pub fn decode(bits: &BitBuffer, max_len: usize) -> String {
    let table = decode_table();
    let mut s = String::with_capacity(max_len);
    for i in 0..max_len {
        let code = bits.value(i * BITS_PER_CHAR as usize, BITS_PER_CHAR) as usize;
        s.push(table[code]);
    }
    s.trim_end_matches(' ').to_string()
}
