//! services/api/src/adapters/media.rs
//!
//! This module contains the adapter for extracting the audio track of a
//! video file. It implements the `AudioExtractor` port from the `core` crate.

use async_trait::async_trait;
use doc_chat_core::ports::{AudioExtractor, PortError, PortResult};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

/// An adapter that shells out to `ffmpeg` to produce a mono 16 kHz WAV file
/// suitable for transcription.
pub struct FfmpegAudioExtractor {
    ffmpeg_path: String,
}

impl FfmpegAudioExtractor {
    /// Creates a new extractor invoking the given ffmpeg binary.
    pub fn new(ffmpeg_path: String) -> Self {
        Self { ffmpeg_path }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract_audio(&self, video: &Path, temp_dir: &Path) -> PortResult<PathBuf> {
        let audio_path = temp_dir.join(format!("{}.wav", Uuid::new_v4()));
        debug!(
            video = %video.display(),
            audio = %audio_path.display(),
            "Extracting audio track"
        );

        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(video)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg("-y")
            .arg(&audio_path)
            .output()
            .await
            .map_err(|e| {
                PortError::Unexpected(format!("Failed to run {}: {e}", self.ffmpeg_path))
            })?;

        if !output.status.success() {
            // ffmpeg reports the actual failure on the last stderr line.
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("unknown error")
                .to_string();
            return Err(PortError::Unexpected(format!(
                "ffmpeg exited with {}: {reason}",
                output.status
            )));
        }

        Ok(audio_path)
    }
}
