//! API key resolution.
//!
//! Precedence, first match wins:
//!
//! 1. `GEMINI_API_KEY` in the pre-provisioned secrets file
//!    ([`AnalysisConfig::secrets_file`](crate::config::AnalysisConfig)),
//! 2. the `GEMINI_API_KEY` environment variable,
//! 3. a key typed in for this session (`--api-key`).
//!
//! Sources 1 and 2 count as [`CredentialSource::Secret`]. A manual key lives
//! only as long as the session and is never written anywhere.

use crate::config::ConfigError;
use std::fmt;
use std::path::Path;

/// Name of the secret, both as a secrets-file key and an environment variable.
pub const SECRET_NAME: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Pre-provisioned secret (secrets file or environment).
    Secret,
    /// Typed in by the user for this session.
    Manual,
    Missing,
}

/// A resolved API key and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: Option<String>,
    pub source: CredentialSource,
}

impl Credential {
    pub fn missing() -> Self {
        Self {
            key: None,
            source: CredentialSource::Missing,
        }
    }

    /// The key, or `""` when missing. The analyzer treats `""` as a missing credential.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    pub fn is_present(&self) -> bool {
        self.key.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the API key.
///
/// `env` looks up environment variables; the binary passes
/// `|name| std::env::var(name).ok()`.
pub fn resolve(
    secrets_file: &Path,
    env: impl Fn(&str) -> Option<String>,
    manual: Option<&str>,
) -> Result<Credential, ConfigError> {
    let secret = read_secret(secrets_file)?.or_else(|| non_empty(env(SECRET_NAME)));
    if let Some(key) = secret {
        log::debug!("using pre-provisioned API key");
        return Ok(Credential {
            key: Some(key),
            source: CredentialSource::Secret,
        });
    }
    if let Some(key) = non_empty(manual.map(str::to_string)) {
        return Ok(Credential {
            key: Some(key),
            source: CredentialSource::Manual,
        });
    }
    Ok(Credential::missing())
}

/// Read `GEMINI_API_KEY` from a secrets TOML file.
///
/// A missing file or a missing key is `Ok(None)`; an unreadable or invalid
/// file is an error.
pub fn read_secret(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)?;
    Ok(non_empty(
        table
            .get(SECRET_NAME)
            .and_then(|v| v.as_str())
            .map(str::to_string),
    ))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
