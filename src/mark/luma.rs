// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Luminance plane extraction and pixel-domain blending.
//!
//! The watermark lives in the HSB brightness channel: extraction takes
//! `trunc(brightness · 255)` per pixel (which equals `max(R, G, B)`), padded
//! to 8-pixel block multiples; after embedding, the reconstructed plane is
//! blended back through HSB with the original hue and saturation. The HSB
//! conversions follow `java.awt.Color` (f32 arithmetic, `+0.5` rounding) so
//! marks embedded by the Java `dct-watermark` tool extract identically.
//!
//! Image decoding stays outside the codec: anything that exposes per-pixel
//! RGB access through [`PixelImage`] can carry a mark. An adapter for
//! [`image::RgbImage`] is provided behind the `image` feature.

/// Per-pixel RGB access to a mutable raster image.
pub trait PixelImage {
    /// (width, height) in pixels.
    fn dimensions(&self) -> (u32, u32);
    /// RGB triple at (x, y).
    fn rgb(&self, x: u32, y: u32) -> [u8; 3];
    /// Overwrite the RGB triple at (x, y).
    fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

#[cfg(feature = "image")]
impl PixelImage for image::RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        // Inherent ImageBuffer::dimensions, not this trait method.
        image::ImageBuffer::dimensions(self)
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.get_pixel(x, y).0
    }

    fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.put_pixel(x, y, image::Rgb(rgb));
    }
}

/// RGB → (hue, saturation, brightness), each in [0, 1].
pub fn rgb_to_hsb(rgb: [u8; 3]) -> (f32, f32, f32) {
    let (r, g, b) = (i32::from(rgb[0]), i32::from(rgb[1]), i32::from(rgb[2]));
    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);

    let brightness = cmax as f32 / 255.0;
    let saturation = if cmax != 0 {
        (cmax - cmin) as f32 / cmax as f32
    } else {
        0.0
    };
    if saturation == 0.0 {
        return (0.0, 0.0, brightness);
    }

    let span = (cmax - cmin) as f32;
    let redc = (cmax - r) as f32 / span;
    let greenc = (cmax - g) as f32 / span;
    let bluec = (cmax - b) as f32 / span;
    let raw = if r == cmax {
        bluec - greenc
    } else if g == cmax {
        2.0 + redc - bluec
    } else {
        4.0 + greenc - redc
    };
    let mut hue = raw / 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }
    (hue, saturation, brightness)
}

/// (hue, saturation, brightness) → RGB, brightness expected in [0, 1].
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> [u8; 3] {
    if saturation == 0.0 {
        let v = (brightness * 255.0 + 0.5) as u8;
        return [v, v, v];
    }
    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match h as u32 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };
    [
        (r * 255.0 + 0.5) as u8,
        (g * 255.0 + 0.5) as u8,
        (b * 255.0 + 0.5) as u8,
    ]
}

/// Luminance values of a cover image, padded to 8-pixel multiples.
///
/// Padding rows/columns are zero; they take part in block transforms but are
/// never written back to the image.
#[derive(Debug, Clone)]
pub struct LumaPlane {
    /// Padded width, a multiple of 8.
    width: usize,
    /// Padded height, a multiple of 8.
    height: usize,
    data: Vec<i32>,
}

impl LumaPlane {
    /// Extract the brightness plane of `image`.
    pub fn from_image(image: &impl PixelImage) -> Self {
        let (w, h) = image.dimensions();
        let (img_width, img_height) = (w as usize, h as usize);
        let width = img_width.div_ceil(8) * 8;
        let height = img_height.div_ceil(8) * 8;
        let mut data = vec![0i32; width * height];
        for y in 0..img_height {
            for x in 0..img_width {
                let (_, _, v) = rgb_to_hsb(image.rgb(x as u32, y as u32));
                data[y * width + x] = (v * 255.0) as i32;
            }
        }
        Self { width, height, data }
    }

    /// Number of 8×8 blocks horizontally.
    pub fn blocks_wide(&self) -> usize {
        self.width / 8
    }

    /// Number of 8×8 blocks vertically.
    pub fn blocks_tall(&self) -> usize {
        self.height / 8
    }

    pub fn get(&self, x: usize, y: usize) -> i32 {
        self.data[y * self.width + x]
    }

    /// Copy the 8×8 block at block position (bx, by) into `out`.
    pub fn read_block(&self, bx: usize, by: usize, out: &mut [i32; 64]) {
        for row in 0..8 {
            let base = (by * 8 + row) * self.width + bx * 8;
            out[row * 8..row * 8 + 8].copy_from_slice(&self.data[base..base + 8]);
        }
    }

    /// Overwrite the 8×8 block at block position (bx, by) from `block`.
    pub fn write_block(&mut self, bx: usize, by: usize, block: &[i32; 64]) {
        for row in 0..8 {
            let base = (by * 8 + row) * self.width + bx * 8;
            self.data[base..base + 8].copy_from_slice(&block[row * 8..row * 8 + 8]);
        }
    }
}

/// Blend a reconstructed luminance plane back into the image.
///
/// Each pixel keeps its hue and saturation; the new brightness is
/// `v·(1−opacity) + (g/255)·opacity`, clamped to [0, 1] (the reconstructed
/// plane can overshoot the byte range after the inverse DCT).
pub fn apply_luminance(image: &mut impl PixelImage, plane: &LumaPlane, opacity: f64) {
    let (w, h) = image.dimensions();
    for y in 0..h {
        for x in 0..w {
            let (hue, sat, v) = rgb_to_hsb(image.rgb(x, y));
            let g = plane.get(x as usize, y as usize);
            let blended =
                (f64::from(v) * (1.0 - opacity) + f64::from(g) * opacity / 255.0).clamp(0.0, 1.0);
            image.set_rgb(x, y, hsb_to_rgb(hue, sat, blended as f32));
        }
    }
}
