//! Pure per-pixel arithmetic.
//!
//! All functions here are pure and testable without any images.

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
///
/// ```
/// # use heritage_restore::imaging::calculations::luma;
/// assert_eq!(luma(255, 255, 255), 255);
/// assert_eq!(luma(0, 0, 0), 0);
/// assert_eq!(luma(128, 128, 128), 128);
/// ```
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000;
    (weighted >> 16) as u8
}

/// Interpolate from `degenerate` toward `value` by `factor`.
///
/// Factors above 1.0 extrapolate away from the degenerate value. The result
/// is clamped to `0..=255` and truncated, so the same inputs always produce
/// the same byte.
pub fn blend_channel(degenerate: u8, value: u8, factor: f32) -> u8 {
    let d = degenerate as f32;
    let out = d + factor * (value as f32 - d);
    if out <= 0.0 {
        0
    } else if out >= 255.0 {
        255
    } else {
        out as u8
    }
}

/// Mean of a luma sum over `count` pixels, rounded half up.
///
/// Returns 0 for an empty image.
pub fn rounded_mean(sum: u64, count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    let mean = sum as f64 / count as f64 + 0.5;
    mean.clamp(0.0, 255.0) as u8
}

/// Apply a 3×3 kernel to a neighbourhood of single-channel samples.
///
/// `samples` is row-major, top-left first, matching [`Kernel3x3::weights`](super::params::Kernel3x3).
pub fn convolve3x3(samples: [u8; 9], weights: &[i32; 9], scale: i32, offset: i32) -> u8 {
    let sum: i32 = samples
        .iter()
        .zip(weights)
        .map(|(s, w)| *s as i32 * w)
        .sum();
    let scale = if scale == 0 { 1 } else { scale };
    let out = (sum as f32 / scale as f32).round() + offset as f32;
    out.clamp(0.0, 255.0) as u8
}

/// Chroma of a pixel: spread between the strongest and weakest channel.
pub fn chroma(r: u8, g: u8, b: u8) -> u8 {
    r.max(g).max(b) - r.min(g).min(b)
}
