//! services/api/tests/http_api.rs
//!
//! Drives the full HTTP surface in-process, with the collaborator ports
//! replaced by mock implementations. The session store, handlers, and
//! background jobs are the real ones.

use api_lib::adapters::InMemorySessionStore;
use api_lib::config::Config;
use api_lib::files::ensure_upload_dirs;
use api_lib::web::{jobs::JobRunner, router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use doc_chat_core::domain::{Transcription, TranscriptSegment};
use doc_chat_core::ports::{
    AudioExtractor, PdfTextExtractor, PortError, PortResult, QuestionAnsweringService,
    TranscriptionService,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// Mock Collaborators
//=========================================================================================

/// A PDF extractor that returns a canned result.
struct StaticPdf(Result<String, String>);

#[async_trait]
impl PdfTextExtractor for StaticPdf {
    async fn extract_text(&self, _path: &Path) -> PortResult<String> {
        self.0.clone().map_err(PortError::Unexpected)
    }
}

/// A PDF extractor that blocks until released, to hold a session busy.
struct GatedPdf {
    release: Arc<Notify>,
}

#[async_trait]
impl PdfTextExtractor for GatedPdf {
    async fn extract_text(&self, _path: &Path) -> PortResult<String> {
        self.release.notified().await;
        Ok("gated text".to_string())
    }
}

/// An audio extractor that writes a real scratch file, so temp-file cleanup
/// in the video job is observable.
struct StaticAudio;

#[async_trait]
impl AudioExtractor for StaticAudio {
    async fn extract_audio(&self, _video: &Path, temp_dir: &Path) -> PortResult<PathBuf> {
        let path = temp_dir.join(format!("{}.wav", Uuid::new_v4()));
        tokio::fs::write(&path, b"RIFF")
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(path)
    }
}

struct StaticTranscriber(Result<Transcription, String>);

#[async_trait]
impl TranscriptionService for StaticTranscriber {
    async fn transcribe(&self, _audio: &Path) -> PortResult<Transcription> {
        self.0.clone().map_err(PortError::Unexpected)
    }
}

struct StaticAnswer(Result<String, String>);

#[async_trait]
impl QuestionAnsweringService for StaticAnswer {
    async fn answer_question(&self, _question: &str, _context: &str) -> PortResult<String> {
        self.0.clone().map_err(PortError::Unexpected)
    }
}

fn sample_transcription() -> Transcription {
    Transcription {
        text: "transcribed speech".to_string(),
        segments: vec![
            TranscriptSegment {
                start: 0.0,
                end: 4.5,
                text: "transcribed".to_string(),
            },
            TranscriptSegment {
                start: 4.5,
                end: 9.0,
                text: "speech".to_string(),
            },
        ],
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct TestHarness {
    app: axum::Router,
    state: Arc<AppState>,
    _scratch: tempfile::TempDir,
}

impl TestHarness {
    async fn new(
        pdf_adapter: Arc<dyn PdfTextExtractor>,
        audio_adapter: Arc<dyn AudioExtractor>,
        transcribe_adapter: Arc<dyn TranscriptionService>,
        qa_adapter: Arc<dyn QuestionAnsweringService>,
    ) -> Self {
        let scratch = tempfile::tempdir().expect("scratch dir");
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            log_level: tracing::Level::INFO,
            upload_dir_pdf: scratch.path().join("pdf"),
            upload_dir_video: scratch.path().join("video"),
            upload_dir_temp: scratch.path().join("temp"),
            max_upload_bytes: 1024 * 1024,
            max_concurrent_jobs: 4,
            ollama_url: "http://localhost:11434".to_string(),
            answer_model: "gemma3:4b".to_string(),
            transcribe_model: "whisper-1".to_string(),
            transcribe_api_base: None,
            openai_api_key: None,
            ffmpeg_path: "ffmpeg".to_string(),
        });
        ensure_upload_dirs(&config).await.expect("upload dirs");

        let state = Arc::new(AppState {
            store: Arc::new(InMemorySessionStore::new()),
            config,
            jobs: Arc::new(JobRunner::new(4)),
            pdf_adapter,
            audio_adapter,
            transcribe_adapter,
            qa_adapter,
        });

        Self {
            app: router(state.clone()),
            state,
            _scratch: scratch,
        }
    }

    /// A harness where only the PDF pipeline matters.
    async fn with_pdf(pdf_adapter: Arc<dyn PdfTextExtractor>) -> Self {
        Self::new(
            pdf_adapter,
            Arc::new(StaticAudio),
            Arc::new(StaticTranscriber(Ok(sample_transcription()))),
            Arc::new(StaticAnswer(Ok("<p>the answer</p>".to_string()))),
        )
        .await
    }

    /// Visits `/` and returns the issued `sid=<uuid>` cookie pair.
    async fn establish_session(&self) -> String {
        let response = self
            .app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie issued")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn token_of(cookie: &str) -> Uuid {
        cookie
            .strip_prefix("sid=")
            .and_then(|v| Uuid::parse_str(v).ok())
            .expect("well-formed session cookie")
    }

    async fn get(&self, cookie: Option<&str>, path: &str) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = self
            .app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        read_response(response).await
    }

    async fn upload(&self, cookie: Option<&str>, filename: &str) -> (StatusCode, String) {
        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             fake file bytes\r\n\
             --{boundary}--\r\n"
        );
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = self
            .app
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        read_response(response).await
    }

    async fn ask(&self, cookie: Option<&str>, question: &str) -> (StatusCode, String) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/ask")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let payload = serde_json::json!({ "question": question }).to_string();
        let response = self
            .app
            .clone()
            .oneshot(builder.body(Body::from(payload)).unwrap())
            .await
            .unwrap();
        read_response(response).await
    }

    /// Polls `/status` until the session's background job finishes, returning
    /// the final status payload.
    async fn wait_until_idle(&self, cookie: &str) -> Value {
        for _ in 0..500 {
            let (status, body) = self.get(Some(cookie), "/status").await;
            assert_eq!(status, StatusCode::OK);
            let value: Value = serde_json::from_str(&body).unwrap();
            if !value["is_processing"].as_bool().unwrap() {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never became idle");
    }

    async fn messages(&self, cookie: &str) -> Vec<Value> {
        let (status, body) = self.get(Some(cookie), "/messages").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        value["messages"].as_array().unwrap().clone()
    }

    fn temp_dir_entries(&self) -> usize {
        std::fs::read_dir(&self.state.config.upload_dir_temp)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

async fn read_response(response: axum::response::Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

//=========================================================================================
// Upload Lifecycle
//=========================================================================================

#[tokio::test]
async fn successful_pdf_upload_populates_text_but_not_messages() {
    let harness =
        TestHarness::with_pdf(Arc::new(StaticPdf(Ok("extracted text".to_string())))).await;
    let cookie = harness.establish_session().await;

    let (status, body) = harness.upload(Some(&cookie), "report.pdf").await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let final_status = harness.wait_until_idle(&cookie).await;
    assert_eq!(
        final_status["status"],
        "File processed successfully. You can now ask questions."
    );

    // No chat yet, but the text is held internally for the next question.
    assert!(harness.messages(&cookie).await.is_empty());
    let session = harness
        .state
        .store
        .get(TestHarness::token_of(&cookie))
        .await
        .unwrap();
    assert_eq!(session.extracted_text, "extracted text");
    assert!(session.segments.is_none());
}

#[tokio::test]
async fn failed_pdf_extraction_surfaces_an_error_status() {
    let harness =
        TestHarness::with_pdf(Arc::new(StaticPdf(Err("corrupt xref table".to_string())))).await;
    let cookie = harness.establish_session().await;

    let (status, _) = harness.upload(Some(&cookie), "broken.pdf").await;
    assert_eq!(status, StatusCode::OK);

    let final_status = harness.wait_until_idle(&cookie).await;
    let text = final_status["status"].as_str().unwrap();
    assert!(text.contains("Error processing PDF"), "got {text:?}");
    assert!(text.contains("corrupt xref table"), "got {text:?}");
}

#[tokio::test]
async fn unsupported_extensions_are_rejected_without_processing() {
    let harness = TestHarness::with_pdf(Arc::new(StaticPdf(Ok("unused".to_string())))).await;
    let cookie = harness.establish_session().await;

    let (status, body) = harness.upload(Some(&cookie), "notes.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unsupported file type"), "got {body:?}");

    let (status, body) = harness.get(Some(&cookie), "/status").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["is_processing"], false);
    assert_eq!(value["status"], "Ready");
}

#[tokio::test]
async fn upload_without_a_file_part_is_rejected() {
    let harness = TestHarness::with_pdf(Arc::new(StaticPdf(Ok("unused".to_string())))).await;
    let cookie = harness.establish_session().await;

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         value\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::COOKIE, &cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    let (status, body) = read_response(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No file provided"), "got {body:?}");
}

#[tokio::test]
async fn a_second_upload_while_processing_is_rejected() {
    let release = Arc::new(Notify::new());
    let harness = TestHarness::with_pdf(Arc::new(GatedPdf {
        release: release.clone(),
    }))
    .await;
    let cookie = harness.establish_session().await;

    let (status, _) = harness.upload(Some(&cookie), "first.pdf").await;
    assert_eq!(status, StatusCode::OK);

    // The first job is still parked inside the extractor.
    let (status, body) = harness.upload(Some(&cookie), "second.pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("still processing"), "got {body:?}");

    release.notify_one();
    harness.wait_until_idle(&cookie).await;
    let session = harness
        .state
        .store
        .get(TestHarness::token_of(&cookie))
        .await
        .unwrap();
    assert_eq!(session.extracted_text, "gated text");
}

//=========================================================================================
// Video Lifecycle
//=========================================================================================

#[tokio::test]
async fn video_upload_stores_transcript_segments_and_cleans_up() {
    let harness = TestHarness::new(
        Arc::new(StaticPdf(Ok("unused".to_string()))),
        Arc::new(StaticAudio),
        Arc::new(StaticTranscriber(Ok(sample_transcription()))),
        Arc::new(StaticAnswer(Ok("<p>the answer</p>".to_string()))),
    )
    .await;
    let cookie = harness.establish_session().await;

    let (status, _) = harness.upload(Some(&cookie), "lecture.mp4").await;
    assert_eq!(status, StatusCode::OK);

    let final_status = harness.wait_until_idle(&cookie).await;
    assert_eq!(
        final_status["status"],
        "File processed successfully. You can now ask questions."
    );

    let session = harness
        .state
        .store
        .get(TestHarness::token_of(&cookie))
        .await
        .unwrap();
    assert_eq!(session.extracted_text, "transcribed speech");
    assert_eq!(session.segments.as_ref().map(Vec::len), Some(2));

    // The temporary audio file was deleted after transcription.
    assert_eq!(harness.temp_dir_entries(), 0);
}

#[tokio::test]
async fn failed_transcription_still_removes_the_temp_audio_file() {
    let harness = TestHarness::new(
        Arc::new(StaticPdf(Ok("unused".to_string()))),
        Arc::new(StaticAudio),
        Arc::new(StaticTranscriber(Err("model not loaded".to_string()))),
        Arc::new(StaticAnswer(Ok("<p>the answer</p>".to_string()))),
    )
    .await;
    let cookie = harness.establish_session().await;

    let (status, _) = harness.upload(Some(&cookie), "lecture.mkv").await;
    assert_eq!(status, StatusCode::OK);

    let final_status = harness.wait_until_idle(&cookie).await;
    let text = final_status["status"].as_str().unwrap();
    assert!(text.contains("Error processing video"), "got {text:?}");
    assert!(text.contains("model not loaded"), "got {text:?}");

    assert_eq!(harness.temp_dir_entries(), 0);
    let session = harness
        .state
        .store
        .get(TestHarness::token_of(&cookie))
        .await
        .unwrap();
    assert!(session.extracted_text.is_empty());
}

//=========================================================================================
// Question Lifecycle
//=========================================================================================

#[tokio::test]
async fn asking_after_upload_appends_question_and_answer() {
    let harness =
        TestHarness::with_pdf(Arc::new(StaticPdf(Ok("extracted text".to_string())))).await;
    let cookie = harness.establish_session().await;

    harness.upload(Some(&cookie), "report.pdf").await;
    harness.wait_until_idle(&cookie).await;

    let (status, body) = harness.ask(Some(&cookie), "What is this about?").await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let final_status = harness.wait_until_idle(&cookie).await;
    assert_eq!(final_status["status"], "Answer generated successfully.");

    let messages = harness.messages(&cookie).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "What is this about?");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "<p>the answer</p>");
}

#[tokio::test]
async fn failed_answer_appears_in_the_transcript_and_status() {
    let harness = TestHarness::new(
        Arc::new(StaticPdf(Ok("extracted text".to_string()))),
        Arc::new(StaticAudio),
        Arc::new(StaticTranscriber(Ok(sample_transcription()))),
        Arc::new(StaticAnswer(Err("connection refused".to_string()))),
    )
    .await;
    let cookie = harness.establish_session().await;

    harness.upload(Some(&cookie), "report.pdf").await;
    harness.wait_until_idle(&cookie).await;

    harness.ask(Some(&cookie), "Anything?").await;
    let final_status = harness.wait_until_idle(&cookie).await;
    let text = final_status["status"].as_str().unwrap();
    assert!(text.contains("Error generating answer"), "got {text:?}");

    let messages = harness.messages(&cookie).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["role"], "assistant");
    let apology = messages[1]["content"].as_str().unwrap();
    assert!(apology.contains("Sorry"), "got {apology:?}");
    assert!(apology.contains("connection refused"), "got {apology:?}");
}

#[tokio::test]
async fn asking_while_processing_is_rejected_and_appends_nothing() {
    let release = Arc::new(Notify::new());
    let harness = TestHarness::with_pdf(Arc::new(GatedPdf {
        release: release.clone(),
    }))
    .await;
    let cookie = harness.establish_session().await;

    harness.upload(Some(&cookie), "slow.pdf").await;

    let (status, body) = harness.ask(Some(&cookie), "Too soon?").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("still processing"), "got {body:?}");
    assert!(harness.messages(&cookie).await.is_empty());

    release.notify_one();
    harness.wait_until_idle(&cookie).await;
}

#[tokio::test]
async fn asking_without_a_document_is_rejected() {
    let harness = TestHarness::with_pdf(Arc::new(StaticPdf(Ok("unused".to_string())))).await;
    let cookie = harness.establish_session().await;

    let (status, body) = harness.ask(Some(&cookie), "Anything there?").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No document content available"), "got {body:?}");
}

#[tokio::test]
async fn empty_questions_are_rejected() {
    let harness =
        TestHarness::with_pdf(Arc::new(StaticPdf(Ok("extracted text".to_string())))).await;
    let cookie = harness.establish_session().await;

    harness.upload(Some(&cookie), "report.pdf").await;
    harness.wait_until_idle(&cookie).await;

    let (status, body) = harness.ask(Some(&cookie), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No question provided"), "got {body:?}");
}

//=========================================================================================
// Session Handling
//=========================================================================================

#[tokio::test]
async fn requests_without_a_session_cookie_are_rejected() {
    let harness = TestHarness::with_pdf(Arc::new(StaticPdf(Ok("unused".to_string())))).await;

    let (status, _) = harness.get(None, "/status").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.get(None, "/messages").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.ask(None, "Hello?").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.upload(None, "report.pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_cookie_for_an_unknown_session_is_rejected() {
    let harness = TestHarness::with_pdf(Arc::new(StaticPdf(Ok("unused".to_string())))).await;
    let stale = format!("sid={}", Uuid::new_v4());

    let (status, body) = harness.get(Some(&stale), "/messages").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Session expired"), "got {body:?}");

    let (status, _) = harness.upload(Some(&stale), "report.pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revisiting_the_page_keeps_the_existing_session() {
    let harness =
        TestHarness::with_pdf(Arc::new(StaticPdf(Ok("extracted text".to_string())))).await;
    let cookie = harness.establish_session().await;

    harness.upload(Some(&cookie), "report.pdf").await;
    harness.wait_until_idle(&cookie).await;

    // A revisit with the cookie must not issue a new token or reset state.
    let request = Request::builder()
        .uri("/")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let session = harness
        .state
        .store
        .get(TestHarness::token_of(&cookie))
        .await
        .unwrap();
    assert_eq!(session.extracted_text, "extracted text");
}
