//! services/api/src/adapters/transcribe.rs
//!
//! This module contains the adapter for Whisper-style audio transcription.
//! It implements the `TranscriptionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{
        AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs, TimestampGranularity,
    },
    Client,
};
use async_trait::async_trait;
use doc_chat_core::domain::{Transcription, TranscriptSegment};
use doc_chat_core::ports::{PortError, PortResult, TranscriptionService};
use std::path::Path;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TranscriptionService` port using an
/// OpenAI-compatible Whisper API. Pointing the client's API base at a local
/// server keeps transcription entirely on-host.
#[derive(Clone)]
pub struct OpenAiTranscribeAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTranscribeAdapter {
    /// Creates a new `OpenAiTranscribeAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `TranscriptionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TranscriptionService for OpenAiTranscribeAdapter {
    /// Transcribes the audio file at `audio`, requesting segment-level
    /// timestamps so answers can later be anchored to points in the video.
    async fn transcribe(&self, audio: &Path) -> PortResult<Transcription> {
        let data = tokio::fs::read(audio)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to read audio file: {e}")))?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, data))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .timestamp_granularities(vec![TimestampGranularity::Segment])
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .audio()
            .transcription()
            .create_verbose_json(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let segments = response
            .segments
            .unwrap_or_default()
            .into_iter()
            .map(|segment| TranscriptSegment {
                start: f64::from(segment.start),
                end: f64::from(segment.end),
                text: segment.text,
            })
            .collect();

        Ok(Transcription {
            text: response.text,
            segments,
        })
    }
}
