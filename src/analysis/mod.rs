//! Damage analysis through a hosted multimodal model.
//!
//! [`analyze`] checks the credential, encodes the bitmap as PNG, and hands
//! the fixed [`prompt`] plus the image to an [`AnalysisService`]. The
//! service's text answer comes back verbatim as an [`Analysis`].
//!
//! Failures stay typed end to end:
//!
//! - an empty key is [`AnalysisError::MissingCredential`], raised before any
//!   I/O. The service is never called.
//! - anything that goes wrong in or on the way to the service is
//!   [`AnalysisError::Service`], carrying a [`ServiceError`].
//!
//! No retries, no caching: every call is one request.
//!
//! The production service is [`GeminiClient`]; tests use a recording mock.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
pub use prompt::{Language, Severity, build_prompt};

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Failure reported by an [`AnalysisService`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API key rejected: {0}")]
    Unauthorized(String),
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Request blocked: {0}")]
    Blocked(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Response contained no text")]
    EmptyResponse,
    #[error("Failed to encode image for upload: {0}")]
    Payload(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("No API key configured: provide a key before requesting an analysis")]
    MissingCredential,
    #[error("Analysis service error: {0}")]
    Service(#[from] ServiceError),
}

/// Free-text commentary from the model, stored and displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
}

/// One outbound analysis request.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub api_key: &'a str,
    pub prompt: &'a str,
    /// PNG-encoded image.
    pub image_png: &'a [u8],
}

/// Transport seam for the analysis call.
///
/// Implementations perform exactly one request per call and return the raw
/// text answer.
pub trait AnalysisService {
    fn generate(&self, request: &AnalysisRequest<'_>) -> Result<String, ServiceError>;
}

/// Request a damage analysis of `image`.
pub fn analyze(
    service: &impl AnalysisService,
    api_key: &str,
    prompt: &str,
    image: &RgbImage,
) -> Result<Analysis, AnalysisError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AnalysisError::MissingCredential);
    }

    let image_png = encode_png(image)?;
    let text = service.generate(&AnalysisRequest {
        api_key,
        prompt,
        image_png: &image_png,
    })?;
    Ok(Analysis { text })
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ServiceError> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ServiceError::Payload(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::gradient_image;
    use std::sync::Mutex;

    /// Mock service that records requests and replays scripted replies.
    ///
    /// Replies are popped from the end; when none are left every call fails
    /// with a transport error.
    #[derive(Default)]
    pub struct MockService {
        pub replies: Mutex<Vec<Result<String, ServiceError>>>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub api_key: String,
        pub prompt: String,
        pub image_png_len: usize,
    }

    impl MockService {
        pub fn replying(text: &str) -> Self {
            Self::with_replies(vec![Ok(text.to_string())])
        }

        pub fn failing(error: ServiceError) -> Self {
            Self::with_replies(vec![Err(error)])
        }

        pub fn with_replies(replies: Vec<Result<String, ServiceError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn get_calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AnalysisService for MockService {
        fn generate(&self, request: &AnalysisRequest<'_>) -> Result<String, ServiceError> {
            self.calls.lock().unwrap().push(RecordedCall {
                api_key: request.api_key.to_string(),
                prompt: request.prompt.to_string(),
                image_png_len: request.image_png.len(),
            });
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ServiceError::Transport("no mock reply".into())))
        }
    }

    #[test]
    fn empty_key_never_calls_service() {
        let service = MockService::replying("should not be seen");
        for key in ["", "   ", "\t\n"] {
            let result = analyze(&service, key, "prompt", &gradient_image(8, 8));
            assert_eq!(result, Err(AnalysisError::MissingCredential));
        }
        assert!(service.get_calls().is_empty());
    }

    #[test]
    fn success_returns_text_verbatim() {
        let text = "🔍 MÔ TẢ HIỆN VẬT:\nA bronze drum.\n\n📊 Severe – 60%";
        let service = MockService::replying(text);
        let analysis = analyze(&service, "AIza-test", "prompt", &gradient_image(8, 8)).unwrap();
        assert_eq!(analysis.text, text);
    }

    #[test]
    fn request_carries_key_prompt_and_png() {
        let service = MockService::replying("ok");
        analyze(&service, "  AIza-test ", "describe it", &gradient_image(8, 8)).unwrap();
        let calls = service.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "AIza-test");
        assert_eq!(calls[0].prompt, "describe it");
        assert!(calls[0].image_png_len > 0);
    }

    #[test]
    fn transport_failure_is_distinguishable() {
        let service = MockService::failing(ServiceError::Transport("connection reset".into()));
        let result = analyze(&service, "AIza-test", "prompt", &gradient_image(8, 8));
        assert_eq!(
            result,
            Err(AnalysisError::Service(ServiceError::Transport(
                "connection reset".into()
            )))
        );
    }

    #[test]
    fn each_call_is_one_request() {
        let service = MockService::with_replies(vec![Ok("second".into()), Ok("first".into())]);
        let img = gradient_image(4, 4);
        assert_eq!(analyze(&service, "k", "p", &img).unwrap().text, "first");
        assert_eq!(analyze(&service, "k", "p", &img).unwrap().text, "second");
        assert_eq!(service.get_calls().len(), 2);
    }
}
