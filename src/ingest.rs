//! Upload validation and decoding.
//!
//! An upload is accepted only when both checks pass:
//!
//! 1. the filename extension is one of [`SUPPORTED_EXTENSIONS`], and
//! 2. the sniffed container format is JPEG, PNG, or WebP.
//!
//! The payload is decoded exactly once and converted to RGB8. The colour mode
//! reported in [`UploadedImage::color_mode`] is the mode of the *source*
//! payload, before conversion.

use image::{ColorType, ImageFormat, ImageReader, RgbImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Filename extensions accepted at the upload boundary (lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

const SUPPORTED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file extension for {0:?} (expected jpg, jpeg, png or webp)")]
    UnsupportedExtension(String),
    #[error("Unsupported image format: {0:?}")]
    UnsupportedFormat(ImageFormat),
    #[error("Failed to decode {filename}: {reason}")]
    Decode { filename: String, reason: String },
}

/// A decoded upload. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub bitmap: RgbImage,
    pub filename: String,
    /// Size of the uploaded payload in bytes.
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    /// Source colour mode, e.g. `RGB`, `RGBA`, `L`.
    pub color_mode: String,
    pub format: ImageFormat,
    /// SHA-256 of the payload, lowercase hex.
    pub digest: String,
}

impl UploadedImage {
    /// Payload size in whole kilobytes, rounded down.
    pub fn size_kb(&self) -> u64 {
        self.byte_size / 1024
    }
}

/// Validate and decode an uploaded payload.
pub fn ingest(filename: &str, bytes: &[u8]) -> Result<UploadedImage, IngestError> {
    check_extension(filename)?;

    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or_else(|| IngestError::Decode {
        filename: filename.to_string(),
        reason: "unrecognized image data".to_string(),
    })?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(IngestError::UnsupportedFormat(format));
    }

    let decoded = reader.decode().map_err(|e| IngestError::Decode {
        filename: filename.to_string(),
        reason: e.to_string(),
    })?;
    let color_mode = color_mode_name(decoded.color()).to_string();
    let bitmap = decoded.to_rgb8();
    let (width, height) = bitmap.dimensions();

    log::debug!(
        "ingested {filename}: {format:?} {width}x{height} {color_mode}, {} bytes",
        bytes.len()
    );

    Ok(UploadedImage {
        bitmap,
        filename: filename.to_string(),
        byte_size: bytes.len() as u64,
        width,
        height,
        color_mode,
        format,
        digest: hex_digest(bytes),
    })
}

/// Read a file from disk and ingest it under its own file name.
pub fn ingest_path(path: &Path) -> Result<UploadedImage, IngestError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    check_extension(&filename)?;
    let bytes = std::fs::read(path)?;
    ingest(&filename, &bytes)
}

fn check_extension(filename: &str) -> Result<(), IngestError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(IngestError::UnsupportedExtension(filename.to_string())),
    }
}

/// PIL-style name of a colour type.
pub fn color_mode_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "unknown",
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn ingest_png_reports_dimensions() {
        let bytes = encoded(&gradient_image(400, 300), ImageFormat::Png);
        let img = ingest("vase.png", &bytes).unwrap();
        assert_eq!((img.width, img.height), (400, 300));
        assert_eq!(img.bitmap.dimensions(), (400, 300));
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!(img.color_mode, "RGB");
        assert_eq!(img.byte_size, bytes.len() as u64);
        assert_eq!(img.filename, "vase.png");
    }

    #[test]
    fn ingest_jpeg_with_both_extensions() {
        let bytes = encoded(&gradient_image(64, 48), ImageFormat::Jpeg);
        for name in ["bowl.jpg", "bowl.jpeg", "BOWL.JPG"] {
            let img = ingest(name, &bytes).unwrap();
            assert_eq!((img.width, img.height), (64, 48));
            assert_eq!(img.format, ImageFormat::Jpeg);
        }
    }

    #[test]
    fn ingest_webp() {
        let bytes = encoded(&gradient_image(33, 21), ImageFormat::WebP);
        let img = ingest("mask.webp", &bytes).unwrap();
        assert_eq!((img.width, img.height), (33, 21));
        assert_eq!(img.format, ImageFormat::WebP);
    }

    #[test]
    fn ingest_greyscale_reports_source_mode() {
        let img = ingest("stele.png", &encoded_grey_png(10, 10)).unwrap();
        assert_eq!(img.color_mode, "L");
        // Bitmap is still RGB
        assert_eq!(img.bitmap.get_pixel(3, 0).0, [3, 3, 3]);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let bytes = encoded(&gradient_image(8, 8), ImageFormat::Png);
        let result = ingest("scan.tiff", &bytes);
        assert!(matches!(result, Err(IngestError::UnsupportedExtension(_))));
        let result = ingest("no_extension", &bytes);
        assert!(matches!(result, Err(IngestError::UnsupportedExtension(_))));
    }

    #[test]
    fn rejects_unsupported_format_behind_allowed_extension() {
        let result = ingest("sneaky.png", &gif_bytes());
        assert!(matches!(
            result,
            Err(IngestError::UnsupportedFormat(ImageFormat::Gif))
        ));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = ingest("broken.jpg", b"definitely not an image");
        assert!(matches!(result, Err(IngestError::Decode { .. })));
    }

    #[test]
    fn rejects_truncated_png() {
        let bytes = encoded(&gradient_image(50, 50), ImageFormat::Png);
        let result = ingest("torn.png", &bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(IngestError::Decode { .. })));
    }

    #[test]
    fn digest_is_stable_and_content_addressed() {
        let a = encoded(&gradient_image(8, 8), ImageFormat::Png);
        let b = encoded(&solid_image(8, 8, [1, 2, 3]), ImageFormat::Png);
        let first = ingest("a.png", &a).unwrap();
        let again = ingest("renamed.png", &a).unwrap();
        let other = ingest("b.png", &b).unwrap();
        assert_eq!(first.digest, again.digest);
        assert_ne!(first.digest, other.digest);
        assert_eq!(first.digest.len(), 64);
    }

    #[test]
    fn size_kb_rounds_down() {
        let mut img = ingest("a.png", &encoded(&gradient_image(4, 4), ImageFormat::Png)).unwrap();
        img.byte_size = 2047;
        assert_eq!(img.size_kb(), 1);
    }

    #[test]
    fn ingest_path_uses_file_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("urn.png");
        std::fs::write(&path, encoded(&gradient_image(12, 7), ImageFormat::Png)).unwrap();
        let img = ingest_path(&path).unwrap();
        assert_eq!(img.filename, "urn.png");
        assert_eq!((img.width, img.height), (12, 7));
    }

    #[test]
    fn ingest_path_missing_file_is_io_error() {
        let result = ingest_path(Path::new("/nonexistent/urn.png"));
        assert!(matches!(result, Err(IngestError::Io(_))));
    }
}
