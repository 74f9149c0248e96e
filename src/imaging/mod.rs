//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Operation | Implementation |
//! |---|---|
//! | **Decode** (JPEG, PNG, WebP) | `image::ImageReader` with format sniffing ([`crate::ingest`]) |
//! | **Sharpen** | fixed 3×3 kernel, [`enhance::sharpen`] |
//! | **Contrast / Color / Brightness** | degenerate-image blends, [`enhance`] |
//! | **Statistics** | [`metrics::measure`] |
//! | **Encode → PNG** | `image::codecs::png` ([`crate::export`]) |
//!
//! The module is split into:
//! - **Calculations**: Pure per-pixel arithmetic (unit testable)
//! - **Parameters**: Data structures describing enhancement steps
//! - **Enhance**: The pixel work, parallelized per row with rayon
//! - **Metrics**: Whole-image brightness/contrast/saturation

pub mod calculations;
pub mod enhance;
pub mod metrics;
mod params;

pub use enhance::{apply, apply_chain};
pub use metrics::{ImageStats, measure};
pub use params::{Enhancement, Factor, Kernel3x3};
