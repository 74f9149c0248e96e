//! CLI output formatting for all pipeline stages.
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! vase.jpg
//!     Size: 400 × 300 px, 87 KB
//!     Source mode: RGB (JPEG)
//!     Digest: 3f2a9c01b7e4
//! ```
//!
//! ## Analyze
//!
//! ```text
//! Analysis
//!     **1. Artifact description:** ...
//! ```
//!
//! A failed analysis is rendered as an error block, never as analysis text:
//!
//! ```text
//! Analysis failed
//!     Error: Quota exceeded: daily limit
//! ```
//!
//! ## Restore
//!
//! ```text
//! [  0%] Uploading image to server...
//! [ 10%] Processing...
//! ...
//! [100%] Restored image received!
//! Saved restored_vase.jpg (image/png, 412 KB)
//!     Path: out/restored_vase.jpg
//! ```
//!
//! ## Compare
//!
//! ```text
//! Comparison     original  restored
//!     Brightness    112.4     126.9
//!     Contrast       41.2      55.0
//!     Saturation     23.7      31.8
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::credentials::{Credential, CredentialSource};
use crate::export::Download;
use crate::imaging::ImageStats;
use crate::ingest::UploadedImage;
use crate::restore::ProgressEvent;
use crate::session::AnalysisOutcome;
use image::ImageFormat;
use std::path::Path;

const DIGEST_PREFIX_LEN: usize = 12;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::WebP => "WEBP",
        _ => "other",
    }
}

// ============================================================================
// Inspect
// ============================================================================

/// Format the info card shown after a successful upload.
///
/// The mode is that of the uploaded payload; the bitmap itself is always RGB.
pub fn format_image_info(image: &UploadedImage) -> Vec<String> {
    let digest: String = image.digest.chars().take(DIGEST_PREFIX_LEN).collect();
    vec![
        image.filename.clone(),
        format!(
            "{}Size: {} × {} px, {} KB",
            indent(1),
            image.width,
            image.height,
            image.size_kb()
        ),
        format!(
            "{}Source mode: {} ({})",
            indent(1),
            image.color_mode,
            format_name(image.format)
        ),
        format!("{}Digest: {}", indent(1), digest),
    ]
}

pub fn print_image_info(image: &UploadedImage) {
    for line in format_image_info(image) {
        println!("{}", line);
    }
}

/// One line describing where the API key came from. Never shows the key.
pub fn format_credential_status(credential: &Credential) -> String {
    match credential.source {
        CredentialSource::Secret => "API key: configured from secrets".to_string(),
        CredentialSource::Manual => "API key: entered for this session".to_string(),
        CredentialSource::Missing => {
            "API key: missing (set GEMINI_API_KEY or pass --api-key)".to_string()
        }
    }
}

// ============================================================================
// Analyze
// ============================================================================

/// Shown in place of an analysis when a full run has no API key.
pub fn format_missing_credential_hint() -> String {
    "Analysis skipped: no API key (pass --api-key, or --skip-analysis to silence this)"
        .to_string()
}

/// Format an analysis outcome. Text is shown verbatim, indented.
pub fn format_analysis(outcome: &AnalysisOutcome) -> Vec<String> {
    match outcome {
        AnalysisOutcome::Completed { analysis, .. } => {
            let mut lines = vec!["Analysis".to_string()];
            lines.extend(analysis.text.lines().map(|l| {
                if l.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", indent(1), l)
                }
            }));
            lines
        }
        AnalysisOutcome::Failed { error, .. } => vec![
            "Analysis failed".to_string(),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

pub fn print_analysis(outcome: &AnalysisOutcome) {
    for line in format_analysis(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Restore
// ============================================================================

/// Format a single restoration progress event.
pub fn format_progress_event(event: &ProgressEvent) -> String {
    format!("[{:>3}%] {}", event.percent, event.label)
}

/// Format the result of writing an export to disk.
pub fn format_download(download: &Download, path: &Path) -> Vec<String> {
    vec![
        format!(
            "Saved {} ({}, {} KB)",
            download.filename,
            download.mime,
            download.bytes.len() / 1024
        ),
        format!("{}Path: {}", indent(1), path.display()),
    ]
}

pub fn print_download(download: &Download, path: &Path) {
    for line in format_download(download, path) {
        println!("{}", line);
    }
}

// ============================================================================
// Compare
// ============================================================================

/// Format a before/after statistics table.
pub fn format_comparison(before: &ImageStats, after: &ImageStats) -> Vec<String> {
    let rows = [
        ("Brightness", before.brightness, after.brightness),
        ("Contrast", before.contrast, after.contrast),
        ("Saturation", before.saturation, after.saturation),
    ];
    let mut lines = vec![format!("{:<14}{:>9}{:>10}", "Comparison", "original", "restored")];
    for (name, b, a) in rows {
        lines.push(format!("{}{:<10}{:>9.1}{:>10.1}", indent(1), name, b, a));
    }
    lines
}

pub fn print_comparison(before: &ImageStats, after: &ImageStats) {
    for line in format_comparison(before, after) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
