//! Parameter types for enhancement operations.
//!
//! These types describe *what* to do to a bitmap, not *how*. The pixel work
//! lives in [`enhance`](super::enhance); the fixed restoration chain that
//! strings these together lives in [`crate::restore`].
//!
//! ## Types
//!
//! - [`Factor`]: Non-negative enhancement multiplier (1.0 = unchanged). Clamped on construction.
//! - [`Kernel3x3`]: Integer convolution kernel with a scale divisor and offset.
//! - [`Enhancement`]: One step of an enhancement chain.

/// Enhancement multiplier. `1.0` returns the input unchanged, `0.0` returns
/// the degenerate image (black for brightness, grey for colour, flat mean
/// for contrast).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factor(f32);

impl Factor {
    pub const IDENTITY: Factor = Factor(1.0);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::IDENTITY;
        }
        Self(value.max(0.0))
    }

    /// Const constructor for fixed chains. `value` must be finite and non-negative.
    pub const fn from_const(value: f32) -> Self {
        Self(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Factor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A 3×3 convolution kernel.
///
/// Each output channel is `sum(weight * pixel) / scale + offset`, rounded and
/// clamped to `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel3x3 {
    /// Row-major weights, top-left first.
    pub weights: [i32; 9],
    pub scale: i32,
    pub offset: i32,
}

impl Kernel3x3 {
    /// Classic edge-enhancing sharpen: centre 32, neighbours -2, divided by 16.
    pub const SHARPEN: Kernel3x3 = Kernel3x3 {
        weights: [-2, -2, -2, -2, 32, -2, -2, -2, -2],
        scale: 16,
        offset: 0,
    };

    /// Sum of weights. A kernel whose sum equals its scale preserves flat regions.
    pub fn weight_sum(&self) -> i32 {
        self.weights.iter().sum()
    }
}

/// One step of an enhancement chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Enhancement {
    Sharpen(Kernel3x3),
    Contrast(Factor),
    Color(Factor),
    Brightness(Factor),
}

impl Enhancement {
    /// Short human-readable name, used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Enhancement::Sharpen(_) => "sharpen",
            Enhancement::Contrast(_) => "contrast",
            Enhancement::Color(_) => "color",
            Enhancement::Brightness(_) => "brightness",
        }
    }
}
