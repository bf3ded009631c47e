//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::jobs::JobRunner;
use doc_chat_core::ports::{
    AudioExtractor, PdfTextExtractor, QuestionAnsweringService, SessionStore,
    TranscriptionService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests and Background Jobs)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers and background jobs.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
    pub jobs: Arc<JobRunner>,
    pub pdf_adapter: Arc<dyn PdfTextExtractor>,
    pub audio_adapter: Arc<dyn AudioExtractor>,
    pub transcribe_adapter: Arc<dyn TranscriptionService>,
    pub qa_adapter: Arc<dyn QuestionAnsweringService>,
}
