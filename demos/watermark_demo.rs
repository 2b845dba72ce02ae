// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/dctmark

//! Example: embed a watermark into an image file, save it as JPEG, read it
//! back and extract the message again.
//!
//! Run with `RUST_LOG=debug` to see the codec's error-correction stats.

use dctmark_core::{Settings, Watermark};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: watermark_demo <input-image> <message> [output.jpg]");
        eprintln!("       watermark_demo --extract <marked-image>");
        std::process::exit(1);
    }

    let wm = Watermark::new(Settings {
        debug: true,
        ..Settings::default()
    })
    .expect("default settings are valid");

    if args[1] == "--extract" {
        let img = image::open(&args[2]).expect("could not read image").to_rgb8();
        match wm.extract_text(&img) {
            Ok(message) => println!("Extracted message: {message:?}"),
            Err(e) => eprintln!("Extraction failed: {e}"),
        }
        return;
    }

    let mut img = image::open(&args[1]).expect("could not read image").to_rgb8();
    let message = &args[2];
    let out_path = args.get(3).cloned().unwrap_or_else(|| "marked.jpg".into());

    println!("Image:            {}x{}", img.width(), img.height());
    println!("Message:          {message:?}");
    println!("Max bits total:   {}", wm.max_bits_total());
    println!("Max bits message: {}", wm.max_bits_data());
    println!("Max text len:     {}", wm.max_text_len());

    wm.embed_text(&mut img, message).expect("embedding failed");
    img.save(&out_path).expect("could not write output");
    println!("Marked image written to: {out_path}");

    // Read it back through the file to prove the mark survives the save.
    let reloaded = image::open(&out_path).expect("could not re-read output").to_rgb8();
    match wm.extract_text(&reloaded) {
        Ok(extracted) => println!("Extracted message: {extracted:?}"),
        Err(e) => eprintln!("Extraction failed: {e}"),
    }
}
