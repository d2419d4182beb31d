//! Deterministic image payloads for tests.
#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A small solid-colour PNG, identical on every call.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([240, 128, 32]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encoding a PNG in memory cannot fail");
    out.into_inner()
}

/// A small JPEG, for extension detection.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(4, 4, Rgb([10, 200, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg)
        .expect("encoding a JPEG in memory cannot fail");
    out.into_inner()
}

pub const ANIMAL_WORDS: &str = "cat, dog, bird, fish, horse";
