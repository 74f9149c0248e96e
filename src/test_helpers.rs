//! Shared test utilities for the heritage-restore test suite.
//!
//! Provides synthetic bitmaps and encoded upload payloads so tests never
//! depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = encoded(&gradient_image(400, 300), ImageFormat::Png);
//! let uploaded = ingest("vase.png", &bytes).unwrap();
//! assert_eq!((uploaded.width, uploaded.height), (400, 300));
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

// =========================================================================
// Synthetic bitmaps
// =========================================================================

/// A single-colour image.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}

/// A red/green gradient over a constant blue channel. Every pixel differs
/// from its neighbours, which makes it a good input for the sharpen step.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

// =========================================================================
// Encoded payloads
// =========================================================================

/// Encode an image to bytes in the given container format.
pub fn encoded(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, format)
        .unwrap_or_else(|e| panic!("failed to encode test image as {format:?}: {e}"));
    buf.into_inner()
}

/// Encode a greyscale image, for colour-mode tests.
pub fn encoded_grey_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::GrayImage::from_fn(width, height, |x, _| image::Luma([(x % 256) as u8]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// A minimal valid GIF payload, decodable in principle, but not an accepted
/// upload format.
pub fn gif_bytes() -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0, 0x3b]);
    bytes
}
