pub mod domain;
pub mod ports;
pub mod transcript;

pub use domain::{ChatMessage, ChatSession, MessageRole, Transcription, TranscriptSegment};
pub use ports::{
    AudioExtractor, PdfTextExtractor, PortError, PortResult, QuestionAnsweringService,
    SessionStore, TranscriptionService,
};
pub use transcript::{find_text_around_timestamp, format_timestamp, DEFAULT_CONTEXT_WINDOW_SECS};
