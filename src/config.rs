//! Application configuration.
//!
//! Handles loading, validating, and merging `heritage-restore.toml`. Stock
//! defaults are serialized to a TOML table and the user's file is merged on
//! top, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [analysis]
//! model = "gemini-1.5-flash"
//! api_base = "https://generativelanguage.googleapis.com/v1beta"
//! language = "vi"              # "vi" or "en"
//! secrets_file = "secrets.toml"
//! # timeout_secs = 60         # omit to wait indefinitely
//!
//! [restoration]
//! progress = true              # show staged progress while restoring
//! step_delay_ms = 150          # pause per 10% progress step (0 = none)
//!
//! [processing]
//! # max_threads = 4           # omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The API key itself never lives here. See [`crate::credentials`].

use crate::analysis::Language;
use crate::analysis::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `heritage-restore.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Damage analysis service settings.
    pub analysis: AnalysisConfig,
    /// Simulated restoration settings.
    pub restoration: RestorationConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "analysis.model must not be empty".into(),
            ));
        }
        let base = self.analysis.api_base.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::Validation(
                "analysis.api_base must be an http(s) URL".into(),
            ));
        }
        if self.analysis.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "analysis.timeout_secs must be positive (omit it to disable the timeout)".into(),
            ));
        }
        if self.restoration.step_delay_ms > 10_000 {
            return Err(ConfigError::Validation(
                "restoration.step_delay_ms must be at most 10000".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Gemini model name, with or without the `models/` prefix.
    pub model: String,
    /// Base URL of the Generative Language API.
    pub api_base: String,
    /// Language the analysis is requested in.
    pub language: Language,
    /// Request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Path of the pre-provisioned secrets file holding `GEMINI_API_KEY`.
    pub secrets_file: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            language: Language::default(),
            timeout_secs: None,
            secrets_file: "secrets.toml".to_string(),
        }
    }
}

/// Simulated restoration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestorationConfig {
    /// Report staged progress while restoring.
    pub progress: bool,
    /// Pause per 10% progress step, in milliseconds.
    pub step_delay_ms: u64,
}

impl Default for RestorationConfig {
    fn default() -> Self {
        Self {
            progress: true,
            step_delay_ms: 150,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of threads for pixel work.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AppConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Heritage Restore Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Damage analysis (Google Gemini)
# ---------------------------------------------------------------------------
[analysis]
# Model used for the analysis request.
model = "gemini-1.5-flash"

# Base URL of the Generative Language API.
api_base = "https://generativelanguage.googleapis.com/v1beta"

# Language the analysis is written in: "vi" (Vietnamese) or "en" (English).
language = "vi"

# Pre-provisioned secrets file. If it contains GEMINI_API_KEY = "...", that
# key is used and --api-key is ignored. The GEMINI_API_KEY environment
# variable is checked next.
secrets_file = "secrets.toml"

# Request timeout in seconds. Omit to wait for the service indefinitely.
# timeout_secs = 60

# ---------------------------------------------------------------------------
# Simulated restoration
# ---------------------------------------------------------------------------
[restoration]
# Show the staged progress milestones while restoring.
progress = true

# Pause per 10% progress step, in milliseconds. 0 disables the pauses.
step_delay_ms = 150

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum threads used for pixel work.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
