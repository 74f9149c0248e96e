//! # Heritage Restore
//!
//! A small pipeline for photos of damaged cultural artifacts: upload a
//! photo, ask a hosted multimodal model (Google Gemini) for a free-text damage
//! assessment, run a *simulated* restoration, and export the result as PNG.
//!
//! # Architecture: Upload → Analyze → Restore → Export
//!
//! ```text
//! bytes ──ingest──▶ UploadedImage ──┬──analyze──▶ AnalysisOutcome
//!                                   └──restore──▶ RestoredImage ──export──▶ PNG
//! ```
//!
//! Analysis and restoration are independent: either can run without the
//! other, in any order, any number of times. A [`session::Session`] holds the
//! latest result of each stage for one user.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ingest`] | Upload validation: extension + sniffed format, decode once to RGB8 |
//! | [`analysis`] | Prompt, `AnalysisService` seam, Gemini REST client |
//! | [`restore`] | The fixed four-step filter chain and staged progress reporting |
//! | [`imaging`] | Pure-Rust pixel operations (sharpen, contrast, colour, brightness) and statistics |
//! | [`session`] | Per-session pipeline state and its stage transitions |
//! | [`export`] | PNG download with `restored_<name>` naming |
//! | [`credentials`] | API key resolution: secrets file, environment, manual entry |
//! | [`config`] | `heritage-restore.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Restoration Is Simulated
//!
//! [`restore::simulate_restoration`] is a fixed chain of cosmetic filters.
//! It ignores the analysis and takes no parameters. It exists so the rest of
//! the pipeline can be exercised end to end until a real restoration service
//! is plugged in.
//!
//! ## Failures Are Values
//!
//! A failed analysis is stored as [`session::AnalysisOutcome::Failed`], never
//! as text that could be mistaken for an assessment. A missing API key is
//! caught before any network I/O.
//!
//! ## One Owned Session Per User
//!
//! There is no global state. A session is an ordinary value; isolation
//! between users is ownership.

pub mod analysis;
pub mod config;
pub mod credentials;
pub mod export;
pub mod imaging;
pub mod ingest;
pub mod output;
pub mod restore;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
