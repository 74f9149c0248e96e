//! Pixel-level enhancement operations on RGB8 bitmaps.
//!
//! | Operation | Degenerate image | Notes |
//! |---|---|---|
//! | [`sharpen`] | n/a | 3×3 convolution, border pixels copied unchanged |
//! | [`contrast`] | flat grey at the rounded mean luma | |
//! | [`color`] | per-pixel luma (greyscale) | |
//! | [`brightness`] | black | |
//!
//! Each blend is `degenerate + factor * (pixel - degenerate)` per channel,
//! clamped and truncated (see [`blend_channel`]).
//!
//! Rows are processed in parallel with rayon. Every output byte depends only
//! on the input bitmap, so results are identical for any thread count.

use super::calculations::{blend_channel, convolve3x3, luma, rounded_mean};
use super::params::{Enhancement, Factor, Kernel3x3};
use image::RgbImage;
use rayon::prelude::*;

/// Apply a single enhancement step.
pub fn apply(img: &RgbImage, step: &Enhancement) -> RgbImage {
    match step {
        Enhancement::Sharpen(kernel) => sharpen(img, kernel),
        Enhancement::Contrast(factor) => contrast(img, *factor),
        Enhancement::Color(factor) => color(img, *factor),
        Enhancement::Brightness(factor) => brightness(img, *factor),
    }
}

/// Apply a chain of enhancement steps in order.
pub fn apply_chain(img: &RgbImage, steps: &[Enhancement]) -> RgbImage {
    steps.iter().fold(img.clone(), |acc, step| {
        log::debug!("enhance: {}", step.name());
        apply(&acc, step)
    })
}

/// Convolve with a 3×3 kernel. Images smaller than 3×3 are returned unchanged.
///
/// Border pixels are copied from the source, not filtered with clamped
/// neighbours as `image::imageops::filter3x3` would.
pub fn sharpen(img: &RgbImage, kernel: &Kernel3x3) -> RgbImage {
    let (width, height) = img.dimensions();
    if width < 3 || height < 3 {
        return img.clone();
    }

    let w = width as usize;
    let h = height as usize;
    let stride = w * 3;
    let src = img.as_raw();
    let mut out = src.clone();

    out.par_chunks_mut(stride)
        .enumerate()
        .filter(|(y, _)| *y > 0 && *y < h - 1)
        .for_each(|(y, row)| {
            for x in 1..w - 1 {
                for c in 0..3 {
                    let mut samples = [0u8; 9];
                    for (i, sample) in samples.iter_mut().enumerate() {
                        let sy = y + i / 3 - 1;
                        let sx = x + i % 3 - 1;
                        *sample = src[sy * stride + sx * 3 + c];
                    }
                    row[x * 3 + c] =
                        convolve3x3(samples, &kernel.weights, kernel.scale, kernel.offset);
                }
            }
        });

    into_image(width, height, out)
}

/// Scale each channel's distance from the image's mean luma.
pub fn contrast(img: &RgbImage, factor: Factor) -> RgbImage {
    let mean = mean_luma(img);
    map_pixels(img, |[r, g, b]| {
        [
            blend_channel(mean, r, factor.value()),
            blend_channel(mean, g, factor.value()),
            blend_channel(mean, b, factor.value()),
        ]
    })
}

/// Scale each channel's distance from the pixel's own luma.
pub fn color(img: &RgbImage, factor: Factor) -> RgbImage {
    map_pixels(img, |[r, g, b]| {
        let grey = luma(r, g, b);
        [
            blend_channel(grey, r, factor.value()),
            blend_channel(grey, g, factor.value()),
            blend_channel(grey, b, factor.value()),
        ]
    })
}

/// Scale every channel toward or away from black.
pub fn brightness(img: &RgbImage, factor: Factor) -> RgbImage {
    map_pixels(img, |[r, g, b]| {
        [
            blend_channel(0, r, factor.value()),
            blend_channel(0, g, factor.value()),
            blend_channel(0, b, factor.value()),
        ]
    })
}

/// Rounded mean luma over the whole image.
pub fn mean_luma(img: &RgbImage) -> u8 {
    let sum: u64 = img
        .as_raw()
        .par_chunks_exact(3)
        .map(|p| luma(p[0], p[1], p[2]) as u64)
        .sum();
    rounded_mean(sum, img.width() as u64 * img.height() as u64)
}

fn map_pixels<F>(img: &RgbImage, f: F) -> RgbImage
where
    F: Fn([u8; 3]) -> [u8; 3] + Sync,
{
    let mut out = img.as_raw().clone();
    out.par_chunks_exact_mut(3).for_each(|p| {
        let mapped = f([p[0], p[1], p[2]]);
        p.copy_from_slice(&mapped);
    });
    into_image(img.width(), img.height(), out)
}

fn into_image(width: u32, height: u32, raw: Vec<u8>) -> RgbImage {
    // The buffer always comes from an image of the same dimensions.
    RgbImage::from_raw(width, height, raw).unwrap_or_else(|| RgbImage::new(width, height))
}
