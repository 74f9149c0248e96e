//! Google Gemini `generateContent` client.
//!
//! One blocking `POST {api_base}/models/{model}:generateContent` per call,
//! with the API key in the `x-goog-api-key` header so it never appears in
//! URLs or error messages. The body carries the prompt as a text part and
//! the image as an inline base64 PNG part.
//!
//! ## Status mapping
//!
//! | Response | [`ServiceError`] |
//! |---|---|
//! | connect / read failure | `Transport` |
//! | 401, 403, or 400 "API key not valid" | `Unauthorized` |
//! | 429 | `QuotaExceeded` |
//! | other non-2xx | `Http` |
//! | 2xx, no candidates, prompt blocked | `Blocked` |
//! | 2xx, not JSON | `MalformedResponse` |
//! | 2xx, no text parts | `EmptyResponse` |

use super::{AnalysisRequest, AnalysisService, ServiceError};
use crate::config::AnalysisConfig;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    api_base: String,
    model: String,
    http: HttpClient,
}

impl GeminiClient {
    /// Build a client. `timeout = None` waits for the service indefinitely.
    pub fn new(api_base: &str, model: &str, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            model: model.trim().to_string(),
            http,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ServiceError> {
        Self::new(
            &config.api_base,
            &config.model,
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self) -> String {
        let model_path = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl AnalysisService for GeminiClient {
    fn generate(&self, request: &AnalysisRequest<'_>) -> Result<String, ServiceError> {
        let endpoint = self.endpoint();
        log::info!("requesting analysis from {endpoint}");
        let started = std::time::Instant::now();

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, request.api_key)
            .json(&request_body(request.prompt, request.image_png))
            .send()
            .map_err(|e| ServiceError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ServiceError::Transport(e.without_url().to_string()))?;
        log::debug!(
            "analysis response: HTTP {} after {:.1}s, {} bytes",
            status.as_u16(),
            started.elapsed().as_secs_f64(),
            body.len()
        );

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }
        let payload: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
        extract_text(&payload)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn request_body<'a>(prompt: &'a str, image_png: &[u8]) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text { text: prompt },
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: "image/png",
                        data: BASE64.encode(image_png),
                    },
                },
            ],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(payload: &GenerateResponse) -> Result<String, ServiceError> {
    let Some(candidate) = payload.candidates.first() else {
        if let Some(reason) = payload
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(ServiceError::Blocked(reason));
        }
        return Err(ServiceError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if !text.is_empty() {
        return Ok(text);
    }
    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
            Err(ServiceError::Blocked(reason.to_string()))
        }
        _ => Err(ServiceError::EmptyResponse),
    }
}

fn classify_status(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    match status {
        401 | 403 => ServiceError::Unauthorized(message),
        400 if message.contains("API key not valid") => ServiceError::Unauthorized(message),
        429 => ServiceError::QuotaExceeded(message),
        _ => ServiceError::Http { status, message },
    }
}
