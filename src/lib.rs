// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! # dctmark-core
//!
//! Blind DCT watermarking for still images: embeds a short text payload
//! into the mid-frequency DCT coefficients of the luminance channel so it
//! survives lossy recompression (JPEG) and mild manipulation, and can be
//! recovered without the original cover image.
//!
//! The payload is packed with a 6-bit alphabet, protected by a systematic
//! Reed-Solomon code over GF(2^8), painted into a 128×128 bit-cell mark and
//! dispersed by two keyed permutations; both seeds are needed to extract,
//! so they act as a symmetric key. Image decoding/encoding stays outside
//! the core: anything implementing [`PixelImage`] can carry a mark (an
//! adapter for `image::RgbImage` ships behind the default `image` feature).
//!
//! # Quick start
//!
//! ```rust,ignore
//! use dctmark_core::{Settings, Watermark};
//!
//! let wm = Watermark::new(Settings::default())?;
//! let mut img: image::RgbImage = image::open("photo.png")?.to_rgb8();
//! wm.embed_text(&mut img, "hello world")?;
//! img.save("photo_marked.jpg")?;
//!
//! let marked = image::open("photo_marked.jpg")?.to_rgb8();
//! assert_eq!(wm.extract_text(&marked)?, "hello world");
//! ```

pub mod dsp;
pub mod mark;

pub use mark::bits::BitBuffer;
pub use mark::luma::PixelImage;
pub use mark::text::ALPHABET;
pub use mark::{Settings, Watermark, WatermarkError, MARK_AREA, MARK_SIZE};
