//! crates/doc_chat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any web framework or serialization format.

use chrono::{DateTime, Utc};

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// The wire-level name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single entry in a session's chat transcript.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

/// A time-bounded unit of transcribed speech. Offsets are in seconds from
/// the start of the recording.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The result of transcribing an audio track.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// Per-browser chat and document state, keyed by an opaque session token.
///
/// `messages` is append-only and keeps chat transcript order.
/// `extracted_text` and `segments` are overwritten wholesale by each new
/// upload; `segments` is only present after a video upload.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
    pub extracted_text: String,
    pub segments: Option<Vec<TranscriptSegment>>,
    pub is_processing: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates an empty session with no document and no job in flight.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            extracted_text: String::new(),
            segments: None,
            is_processing: false,
            created_at: Utc::now(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
