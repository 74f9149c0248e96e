//! Whole-image statistics used to compare an original with its restored
//! counterpart.

use super::calculations::{chroma, luma};
use image::RgbImage;
use rayon::prelude::*;

/// Summary statistics of an RGB bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    /// Mean luma, 0–255.
    pub brightness: f64,
    /// Standard deviation of luma, 0–127.5.
    pub contrast: f64,
    /// Mean chroma (max channel minus min channel), 0–255.
    pub saturation: f64,
}

/// Measure brightness, contrast, and saturation of an image.
///
/// An empty image measures as all zeros.
pub fn measure(img: &RgbImage) -> ImageStats {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return ImageStats {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
        };
    }

    let (luma_sum, luma_sq_sum, chroma_sum) = img
        .as_raw()
        .par_chunks_exact(3)
        .map(|p| {
            let l = luma(p[0], p[1], p[2]) as u64;
            (l, l * l, chroma(p[0], p[1], p[2]) as u64)
        })
        .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

    let n = count as f64;
    let mean = luma_sum as f64 / n;
    let variance = (luma_sq_sum as f64 / n - mean * mean).max(0.0);

    ImageStats {
        brightness: mean,
        contrast: variance.sqrt(),
        saturation: chroma_sum as f64 / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_image, solid_image};

    #[test]
    fn solid_grey_has_no_contrast_or_saturation() {
        let stats = measure(&solid_image(10, 10, [128, 128, 128]));
        assert_eq!(stats.brightness, 128.0);
        assert_eq!(stats.contrast, 0.0);
        assert_eq!(stats.saturation, 0.0);
    }

    #[test]
    fn gradient_has_contrast() {
        let stats = measure(&gradient_image(64, 32));
        assert!(stats.contrast > 0.0);
        assert!(stats.saturation > 0.0);
    }

    #[test]
    fn empty_image_measures_zero() {
        let stats = measure(&RgbImage::new(0, 0));
        assert_eq!(stats.brightness, 0.0);
    }
}
