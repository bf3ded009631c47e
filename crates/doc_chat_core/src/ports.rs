//! crates/doc_chat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like extraction
//! libraries, transcription services, or language models.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::{ChatMessage, ChatSession, Transcription, TranscriptSegment};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., an
/// extraction library or an HTTP client).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Busy: {0}")]
    Busy(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The per-session chat/document state store.
///
/// Sessions are keyed by an opaque token held by the browser. Background jobs
/// and request handlers share one store, so every mutation goes through it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns a snapshot of the session, creating an empty one for an
    /// unseen token.
    async fn get_or_create(&self, token: Uuid) -> ChatSession;

    /// Returns a snapshot of an existing session, or `NotFound`.
    async fn get(&self, token: Uuid) -> PortResult<ChatSession>;

    /// Whether the token has a session entry.
    async fn contains(&self, token: Uuid) -> bool;

    /// Atomically marks the session as processing and records `status`.
    ///
    /// Fails with `Busy` when a background job is already in flight for the
    /// session, which is what keeps two jobs from racing on one session's
    /// document state.
    async fn begin_processing(&self, token: Uuid, status: &str) -> PortResult<()>;

    /// Clears the processing flag. Every background job must call this on
    /// every exit path, success or failure.
    async fn clear_processing(&self, token: Uuid);

    /// Appends a message to the session's transcript.
    async fn append_message(&self, token: Uuid, message: ChatMessage) -> PortResult<()>;

    /// Overwrites the session's extracted text and transcript segments
    /// wholesale. `segments` is `None` for PDF uploads.
    async fn set_document(
        &self,
        token: Uuid,
        text: String,
        segments: Option<Vec<TranscriptSegment>>,
    ) -> PortResult<()>;

    /// Records the human-readable status string. Last write wins; no history.
    async fn set_status(&self, token: Uuid, status: &str);

    /// The current status string, or a fixed "ready" message for tokens with
    /// no recorded status yet.
    async fn status(&self, token: Uuid) -> String;
}

/// Extracts the full text of a PDF file.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> PortResult<String>;
}

/// Extracts the audio track of a video file into `temp_dir`, returning the
/// path of the written audio file. The caller owns the file and is
/// responsible for deleting it.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract_audio(&self, video: &Path, temp_dir: &Path) -> PortResult<PathBuf>;
}

/// Transcribes an audio file into text plus time-coded segments.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> PortResult<Transcription>;
}

/// Answers a question based on a provided document context. The returned
/// string is HTML-formatted, ready for the chat transcript.
#[async_trait]
pub trait QuestionAnsweringService: Send + Sync {
    async fn answer_question(&self, question: &str, context: &str) -> PortResult<String>;
}
