//! Per-session pipeline state.
//!
//! A [`Session`] holds at most one artifact per stage: the uploaded
//! original, the latest analysis outcome, and the latest restored image. It
//! is a plain owned value: create one when a user session starts, drop it
//! when the session ends, and never share one between users.
//!
//! # Stages
//!
//! ```text
//!            upload                 analyze / restore (any order, repeatable)
//! Empty ───────────────▶ Uploaded ─────────────────────────────────────────▶
//!                          ▲        Analyzed │ Restored │ AnalyzedAndRestored
//!                          └──────── upload (new file) ─┘
//! ```
//!
//! Analysis and restoration are independent branches off `Uploaded`: either
//! may run without the other, and each re-run overwrites its previous result.
//!
//! # New uploads clear derived results
//!
//! A successful upload replaces the original **and discards** any analysis
//! or restored image derived from the previous one. A failed upload changes
//! nothing. Every derived artifact also records the digest of the image it
//! was computed from, so [`Session::is_consistent`] can check the invariant.
//!
//! # Failures
//!
//! - No image yet: [`SessionError::NoImage`], state untouched.
//! - No API key: [`SessionError::MissingCredential`], checked before any
//!   network I/O, state untouched.
//! - Service failure: stored as [`AnalysisOutcome::Failed`] (replacing any
//!   previous analysis) *and* returned as [`SessionError::Analysis`]. A
//!   failure is never stored as analysis text.

use crate::analysis::{Analysis, AnalysisError, AnalysisService, ServiceError, analyze};
use crate::export::{Download, ExportError, export_png};
use crate::ingest::{IngestError, UploadedImage, ingest, ingest_path};
use crate::restore::{ProgressEvent, RestoreOptions, restore_with_progress};
use image::RgbImage;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("No image uploaded yet")]
    NoImage,
    #[error("No API key configured: provide a key before requesting an analysis")]
    MissingCredential,
    #[error("Analysis failed: {0}")]
    Analysis(ServiceError),
    #[error("No restored image to export yet")]
    NothingToExport,
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Where the session currently stands.
///
/// The stage records which results exist, not whether they succeeded: a
/// stored [`AnalysisOutcome::Failed`] counts as analyzed. Inspect
/// [`Session::analysis`] to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Empty,
    Uploaded,
    /// An analysis outcome is stored, completed or failed.
    Analyzed,
    Restored,
    /// Both an analysis outcome (completed or failed) and a restored image.
    AnalyzedAndRestored,
}

/// How an analysis attempted by [`Session::try_analyze`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisAttempt {
    Completed,
    /// The service failed; the failure is stored as the session's outcome.
    Failed,
    /// No API key; nothing was sent and the session is unchanged.
    MissingCredential,
}

/// Result of the latest analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed {
        analysis: Analysis,
        source_digest: String,
    },
    Failed {
        error: ServiceError,
        source_digest: String,
    },
}

impl AnalysisOutcome {
    pub fn source_digest(&self) -> &str {
        match self {
            AnalysisOutcome::Completed { source_digest, .. }
            | AnalysisOutcome::Failed { source_digest, .. } => source_digest,
        }
    }

    /// The analysis text, if the request succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Completed { analysis, .. } => Some(&analysis.text),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed { .. })
    }
}

/// The simulated restoration of the current original.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredImage {
    pub bitmap: RgbImage,
    pub source_digest: String,
}

/// One user's pipeline state.
#[derive(Debug, Default)]
pub struct Session {
    original: Option<UploadedImage>,
    analysis: Option<AnalysisOutcome>,
    restored: Option<RestoredImage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        match (&self.original, self.analysis.is_some(), self.restored.is_some()) {
            (None, _, _) => Stage::Empty,
            (Some(_), false, false) => Stage::Uploaded,
            (Some(_), true, false) => Stage::Analyzed,
            (Some(_), false, true) => Stage::Restored,
            (Some(_), true, true) => Stage::AnalyzedAndRestored,
        }
    }

    pub fn original(&self) -> Option<&UploadedImage> {
        self.original.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisOutcome> {
        self.analysis.as_ref()
    }

    pub fn restored(&self) -> Option<&RestoredImage> {
        self.restored.as_ref()
    }

    /// Filename of the current original.
    pub fn filename(&self) -> Option<&str> {
        self.original.as_ref().map(|o| o.filename.as_str())
    }

    /// Decode and store a new upload, discarding results derived from any
    /// previous one. On error the session is unchanged.
    pub fn upload(&mut self, filename: &str, bytes: &[u8]) -> Result<&UploadedImage, SessionError> {
        let image = ingest(filename, bytes)?;
        Ok(self.replace_original(image))
    }

    /// Upload a file from disk under its own file name.
    pub fn upload_path(&mut self, path: &Path) -> Result<&UploadedImage, SessionError> {
        let image = ingest_path(path)?;
        Ok(self.replace_original(image))
    }

    /// Store an already-decoded upload, with the same clearing rule as [`Session::upload`].
    pub fn replace_original(&mut self, image: UploadedImage) -> &UploadedImage {
        let cleared_analysis = self.analysis.take().is_some();
        let cleared_restored = self.restored.take().is_some();
        if cleared_analysis || cleared_restored {
            log::debug!("new upload {}: cleared previous results", image.filename);
        }
        self.original.insert(image)
    }

    /// Request a damage analysis of the current original.
    pub fn analyze(
        &mut self,
        service: &impl AnalysisService,
        api_key: &str,
        prompt: &str,
    ) -> Result<Analysis, SessionError> {
        let original = self.original.as_ref().ok_or(SessionError::NoImage)?;
        let source_digest = original.digest.clone();

        match analyze(service, api_key, prompt, &original.bitmap) {
            Ok(analysis) => {
                self.analysis = Some(AnalysisOutcome::Completed {
                    analysis: analysis.clone(),
                    source_digest,
                });
                Ok(analysis)
            }
            Err(AnalysisError::MissingCredential) => Err(SessionError::MissingCredential),
            Err(AnalysisError::Service(error)) => {
                log::warn!("analysis of {} failed: {error}", original.filename);
                self.analysis = Some(AnalysisOutcome::Failed {
                    error: error.clone(),
                    source_digest,
                });
                Err(SessionError::Analysis(error))
            }
        }
    }

    /// Analyze as one step of a longer run, where the result must not block
    /// restoration. A missing credential or a service failure is reported
    /// as an [`AnalysisAttempt`]; only a missing image is an error.
    pub fn try_analyze(
        &mut self,
        service: &impl AnalysisService,
        api_key: &str,
        prompt: &str,
    ) -> Result<AnalysisAttempt, SessionError> {
        match self.analyze(service, api_key, prompt) {
            Ok(_) => Ok(AnalysisAttempt::Completed),
            Err(SessionError::Analysis(_)) => Ok(AnalysisAttempt::Failed),
            Err(SessionError::MissingCredential) => Ok(AnalysisAttempt::MissingCredential),
            Err(e) => Err(e),
        }
    }

    /// Run the simulated restoration on the current original.
    pub fn restore(
        &mut self,
        options: RestoreOptions,
        progress: Option<&Sender<ProgressEvent>>,
    ) -> Result<&RestoredImage, SessionError> {
        let original = self.original.as_ref().ok_or(SessionError::NoImage)?;
        let bitmap = restore_with_progress(&original.bitmap, options, progress);
        let restored = RestoredImage {
            bitmap,
            source_digest: original.digest.clone(),
        };
        Ok(self.restored.insert(restored))
    }

    /// Export the restored image as a PNG download.
    pub fn export_restored(&self) -> Result<Download, SessionError> {
        let restored = self.restored.as_ref().ok_or(SessionError::NothingToExport)?;
        let filename = self.filename().unwrap_or_default();
        Ok(export_png(&restored.bitmap, filename)?)
    }

    /// Forget everything, returning to [`Stage::Empty`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when every derived artifact belongs to the current original.
    pub fn is_consistent(&self) -> bool {
        let Some(original) = &self.original else {
            return self.analysis.is_none() && self.restored.is_none();
        };
        let analysis_ok = self
            .analysis
            .as_ref()
            .is_none_or(|a| a.source_digest() == original.digest);
        let restored_ok = self
            .restored
            .as_ref()
            .is_none_or(|r| r.source_digest == original.digest);
        analysis_ok && restored_ok
    }
}
