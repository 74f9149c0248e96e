//! Download boundary: the restored image as a PNG byte stream.

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const EXPORT_MIME: &str = "image/png";
pub const EXPORT_PREFIX: &str = "restored_";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// A ready-to-save export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name, `restored_<original filename>`.
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Write the export into `dir` under its suggested name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Suggested download name for a restored image.
///
/// The original name is kept whole, extension included, even though the
/// payload is always PNG. Any directory part is dropped.
pub fn export_filename(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.png".to_string());
    format!("{EXPORT_PREFIX}{base}")
}

/// Encode a bitmap as PNG for download.
pub fn export_png(bitmap: &RgbImage, original_filename: &str) -> Result<Download, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(bitmap.clone()).write_to(&mut buf, ImageFormat::Png)?;
    Ok(Download {
        filename: export_filename(original_filename),
        mime: EXPORT_MIME,
        bytes: buf.into_inner(),
    })
}
