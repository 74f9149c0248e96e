//! Simulated restoration.
//!
//! This is **not** restoration. [`simulate_restoration`] runs a fixed chain of
//! cosmetic filters, [`RESTORATION_CHAIN`], standing in for a future
//! inpainting / super-resolution service. It takes no parameters and ignores
//! the damage analysis: every image gets the same treatment.
//!
//! ```text
//! sharpen (3×3) → contrast ×1.25 → color ×1.15 → brightness ×1.10
//! ```
//!
//! The output is a pure function of the input bitmap.
//!
//! ## Staged progress
//!
//! [`restore_with_progress`] additionally walks 0–100% in 10% steps, emitting a
//! [`ProgressEvent`] per step and pausing a fixed delay between steps. The
//! labels come from [`RESTORE_MILESTONES`]; steps between milestones are
//! labelled [`IN_PROGRESS_LABEL`]. The pacing is cosmetic: no work happens
//! until the last step has been reported.

use crate::imaging::{Enhancement, Factor, Kernel3x3, apply_chain};
use image::RgbImage;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// The fixed restoration filter chain, applied in order.
pub const RESTORATION_CHAIN: [Enhancement; 4] = [
    Enhancement::Sharpen(Kernel3x3::SHARPEN),
    Enhancement::Contrast(Factor::from_const(1.25)),
    Enhancement::Color(Factor::from_const(1.15)),
    Enhancement::Brightness(Factor::from_const(1.10)),
];

/// A labelled progress threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub percent: u8,
    pub label: &'static str,
}

pub const RESTORE_MILESTONES: &[Milestone] = &[
    Milestone {
        percent: 0,
        label: "Uploading image to server...",
    },
    Milestone {
        percent: 20,
        label: "Authenticating & preprocessing...",
    },
    Milestone {
        percent: 40,
        label: "AI model inpainting...",
    },
    Milestone {
        percent: 60,
        label: "Reconstructing damaged regions...",
    },
    Milestone {
        percent: 80,
        label: "Super-resolution upscaling...",
    },
    Milestone {
        percent: 100,
        label: "Restored image received!",
    },
];

pub const IN_PROGRESS_LABEL: &str = "Processing...";

const PROGRESS_STEP: u8 = 10;

/// One progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub label: &'static str,
}

/// Pacing of the staged progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Pause before each 10% step.
    pub step_delay: Duration,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(150),
        }
    }
}

impl RestoreOptions {
    /// No pauses at all.
    pub fn immediate() -> Self {
        Self {
            step_delay: Duration::ZERO,
        }
    }
}

/// Apply the fixed restoration chain.
pub fn simulate_restoration(img: &RgbImage) -> RgbImage {
    apply_chain(img, &RESTORATION_CHAIN)
}

/// The full sequence of progress events, 0% to 100%.
pub fn progress_steps() -> Vec<ProgressEvent> {
    (0..=100)
        .step_by(PROGRESS_STEP as usize)
        .map(|percent| ProgressEvent {
            percent,
            label: label_for(percent),
        })
        .collect()
}

fn label_for(percent: u8) -> &'static str {
    RESTORE_MILESTONES
        .iter()
        .find(|m| m.percent == percent)
        .map(|m| m.label)
        .unwrap_or(IN_PROGRESS_LABEL)
}

/// Report staged progress, then apply the restoration chain.
///
/// Events are sent on `progress` if given. A dropped receiver is ignored.
pub fn restore_with_progress(
    img: &RgbImage,
    options: RestoreOptions,
    progress: Option<&Sender<ProgressEvent>>,
) -> RgbImage {
    for event in progress_steps() {
        if !options.step_delay.is_zero() {
            std::thread::sleep(options.step_delay);
        }
        if let Some(tx) = progress {
            tx.send(event).ok();
        }
    }
    let started = std::time::Instant::now();
    let restored = simulate_restoration(img);
    log::debug!(
        "restoration chain on {}x{} took {:?}",
        img.width(),
        img.height(),
        started.elapsed()
    );
    restored
}
