//! End-to-end tests of the upload → analyze → restore → export pipeline,
//! driven through the public library API with a scripted analysis service.

use heritage_restore::analysis::{
    AnalysisRequest, AnalysisService, Language, ServiceError, build_prompt,
};
use heritage_restore::export::EXPORT_MIME;
use heritage_restore::imaging::measure;
use heritage_restore::restore::{RestoreOptions, progress_steps, simulate_restoration};
use heritage_restore::session::{
    AnalysisAttempt, AnalysisOutcome, Session, SessionError, Stage,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::mpsc;

/// Answers every request with the next scripted reply and counts calls.
struct ScriptedService {
    replies: Mutex<Vec<Result<String, ServiceError>>>,
    calls: Mutex<usize>,
}

impl ScriptedService {
    fn new(mut replies: Vec<Result<String, ServiceError>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl AnalysisService for ScriptedService {
    fn generate(&self, request: &AnalysisRequest<'_>) -> Result<String, ServiceError> {
        assert!(!request.api_key.is_empty());
        assert_eq!(image::guess_format(request.image_png).unwrap(), ImageFormat::Png);
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(ServiceError::EmptyResponse))
    }
}

fn artifact(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let crack = if (x + y) % 37 == 0 { 60 } else { 0 };
        Rgb([
            (120 + x % 40) as u8 - crack,
            (90 + y % 30) as u8,
            (70 + (x * y) % 25) as u8,
        ])
    })
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

#[test]
fn restore_and_export_without_analysis() {
    let mut session = Session::new();
    let uploaded = session
        .upload("vase.jpg", &encode(&artifact(400, 300), ImageFormat::Jpeg))
        .unwrap();
    assert_eq!((uploaded.width, uploaded.height), (400, 300));
    assert_eq!(uploaded.color_mode, "RGB");

    let (tx, rx) = mpsc::channel();
    session
        .restore(RestoreOptions::immediate(), Some(&tx))
        .unwrap();
    drop(tx);
    let percents: Vec<u8> = rx.iter().map(|e| e.percent).collect();
    assert_eq!(
        percents,
        progress_steps().iter().map(|e| e.percent).collect::<Vec<_>>()
    );
    assert_eq!(session.stage(), Stage::Restored);
    assert!(session.analysis().is_none());

    let download = session.export_restored().unwrap();
    assert_eq!(download.filename, "restored_vase.jpg");
    assert_eq!(download.mime, EXPORT_MIME);
    let decoded = image::load_from_memory(&download.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (400, 300));
    assert_eq!(&decoded, &session.restored().unwrap().bitmap);
}

#[test]
fn png_upload_restore_and_export_without_analysis() {
    let mut session = Session::new();
    let uploaded = session
        .upload("vase.png", &encode(&artifact(400, 300), ImageFormat::Png))
        .unwrap();
    assert_eq!((uploaded.width, uploaded.height), (400, 300));
    assert_eq!(uploaded.color_mode, "RGB");
    assert_eq!(uploaded.format, ImageFormat::Png);

    session.restore(RestoreOptions::immediate(), None).unwrap();
    assert_eq!(session.stage(), Stage::Restored);
    assert!(session.analysis().is_none());

    let download = session.export_restored().unwrap();
    assert_eq!(download.filename, "restored_vase.png");
    assert_eq!(download.mime, EXPORT_MIME);
    let decoded = image::load_from_memory(&download.bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (400, 300));
    assert_eq!(decoded, simulate_restoration(&artifact(400, 300)));
}

#[test]
fn run_without_key_still_restores_and_exports() {
    let mut session = Session::new();
    session
        .upload("vase.png", &encode(&artifact(40, 30), ImageFormat::Png))
        .unwrap();
    let service = ScriptedService::new(vec![Ok("unused".into())]);

    let attempt = session.try_analyze(&service, "", "prompt").unwrap();
    assert_eq!(attempt, AnalysisAttempt::MissingCredential);
    assert_eq!(service.calls(), 0);

    session.restore(RestoreOptions::immediate(), None).unwrap();
    let tmp = tempfile::TempDir::new().unwrap();
    let path = session
        .export_restored()
        .unwrap()
        .write_to(&tmp.path().join("out"))
        .unwrap();
    assert!(path.ends_with("out/restored_vase.png"));
    assert!(path.is_file());
}

#[test]
fn full_pipeline_with_analysis() {
    let mut session = Session::new();
    session
        .upload("bowl.png", &encode(&artifact(120, 90), ImageFormat::Png))
        .unwrap();

    let service = ScriptedService::new(vec![Ok("**1. Mô tả:** bát gốm".into())]);
    let prompt = build_prompt(Language::Vi);
    let analysis = session.analyze(&service, "AIza-test", &prompt).unwrap();
    assert_eq!(analysis.text, "**1. Mô tả:** bát gốm");

    session.restore(RestoreOptions::immediate(), None).unwrap();
    assert_eq!(session.stage(), Stage::AnalyzedAndRestored);
    assert!(session.is_consistent());

    let original = &session.original().unwrap().bitmap;
    let restored = &session.restored().unwrap().bitmap;
    assert_eq!(restored, &simulate_restoration(original));
    let (before, after) = (measure(original), measure(restored));
    assert!(after.brightness > before.brightness);
    assert!(after.contrast > before.contrast);
    assert_eq!(service.calls(), 1);
}

#[test]
fn missing_key_never_reaches_the_service() {
    let mut session = Session::new();
    session
        .upload("bowl.png", &encode(&artifact(16, 16), ImageFormat::Png))
        .unwrap();
    let service = ScriptedService::new(vec![Ok("unused".into())]);
    let result = session.analyze(&service, "   ", "prompt");
    assert!(matches!(result, Err(SessionError::MissingCredential)));
    assert_eq!(service.calls(), 0);
    assert_eq!(session.stage(), Stage::Uploaded);
}

#[test]
fn service_failure_is_shown_as_failure_and_restore_still_works() {
    let mut session = Session::new();
    session
        .upload("bowl.webp", &encode(&artifact(32, 24), ImageFormat::WebP))
        .unwrap();
    let service = ScriptedService::new(vec![Err(ServiceError::Unauthorized(
        "API key not valid".into(),
    ))]);
    let result = session.analyze(&service, "bad-key", "prompt");
    assert!(matches!(
        result,
        Err(SessionError::Analysis(ServiceError::Unauthorized(_)))
    ));
    assert!(matches!(
        session.analysis(),
        Some(AnalysisOutcome::Failed { .. })
    ));
    assert_eq!(session.analysis().unwrap().text(), None);

    session.restore(RestoreOptions::immediate(), None).unwrap();
    assert_eq!(
        session.export_restored().unwrap().filename,
        "restored_bowl.webp"
    );
}

#[test]
fn reupload_replaces_everything() {
    let mut session = Session::new();
    session
        .upload("first.png", &encode(&artifact(50, 40), ImageFormat::Png))
        .unwrap();
    let service = ScriptedService::new(vec![Ok("about the first".into())]);
    session.analyze(&service, "key", "prompt").unwrap();
    session.restore(RestoreOptions::immediate(), None).unwrap();

    session
        .upload("second.jpeg", &encode(&artifact(20, 10), ImageFormat::Jpeg))
        .unwrap();
    assert_eq!(session.stage(), Stage::Uploaded);
    assert_eq!(session.filename(), Some("second.jpeg"));
    assert!(session.analysis().is_none());
    assert!(matches!(
        session.export_restored(),
        Err(SessionError::NothingToExport)
    ));

    session.restore(RestoreOptions::immediate(), None).unwrap();
    assert_eq!(session.restored().unwrap().bitmap.dimensions(), (20, 10));
    assert!(session.is_consistent());
}

#[test]
fn rejected_upload_keeps_previous_session() {
    let mut session = Session::new();
    session
        .upload("first.png", &encode(&artifact(10, 10), ImageFormat::Png))
        .unwrap();
    session.restore(RestoreOptions::immediate(), None).unwrap();

    let bmp = b"BM\x3a\x00\x00\x00\x00\x00\x00\x00\x36\x00\x00\x00not really a bitmap";
    assert!(matches!(
        session.upload("scan.bmp", bmp),
        Err(SessionError::Ingest(_))
    ));
    assert!(matches!(
        session.upload("scan.png", bmp),
        Err(SessionError::Ingest(_))
    ));
    assert_eq!(session.filename(), Some("first.png"));
    assert_eq!(session.stage(), Stage::Restored);
}
