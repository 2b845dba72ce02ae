// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Recompression survival: the mark must outlive a lossy JPEG re-encode
//! of the carrier image.

use dctmark_core::{Settings, Watermark};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

fn gray_cover() -> RgbImage {
    RgbImage::from_pixel(512, 512, Rgb([128, 128, 128]))
}

/// Encode to JPEG at the given quality and decode again, in memory.
fn jpeg_round_trip(img: &RgbImage, quality: u8) -> RgbImage {
    let mut bytes: Vec<u8> = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(img).expect("JPEG encode failed");
    image::load_from_memory(&bytes)
        .expect("JPEG decode failed")
        .to_rgb8()
}

/// Embed, save as JPEG quality 85, reload, extract.
#[test]
fn survives_jpeg_quality_85() {
    let wm = Watermark::new(Settings::default()).unwrap();
    let mut img = gray_cover();
    wm.embed_text(&mut img, "abc").unwrap();
    let reloaded = jpeg_round_trip(&img, 85);
    assert_eq!(wm.extract_text(&reloaded).unwrap(), "abc");
}

#[test]
fn survives_jpeg_quality_85_at_reduced_opacity() {
    let wm = Watermark::new(Settings {
        opacity: 0.6,
        ..Settings::default()
    })
    .unwrap();
    let mut img = gray_cover();
    wm.embed_text(&mut img, "abc").unwrap();
    let reloaded = jpeg_round_trip(&img, 85);
    assert_eq!(wm.extract_text(&reloaded).unwrap(), "abc");
}

#[test]
fn survives_jpeg_quality_90_at_capacity() {
    let wm = Watermark::new(Settings::default()).unwrap();
    let mut img = gray_cover();
    wm.embed_text(&mut img, "full capacity !!").unwrap();
    let reloaded = jpeg_round_trip(&img, 90);
    assert_eq!(wm.extract_text(&reloaded).unwrap(), "full capacity !!");
}

/// The debug switch only adds logging; results are identical.
#[test]
fn debug_switch_does_not_change_results() {
    let wm = Watermark::new(Settings::default()).unwrap();
    let dbg = Watermark::new(Settings {
        debug: true,
        ..Settings::default()
    })
    .unwrap();
    let mut img = gray_cover();
    wm.embed_text(&mut img, "abc").unwrap();
    let reloaded = jpeg_round_trip(&img, 85);
    assert_eq!(
        wm.extract_text(&reloaded).unwrap(),
        dbg.extract_text(&reloaded).unwrap()
    );
}
