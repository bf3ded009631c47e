//! services/api/src/web/jobs.rs
//!
//! The background "worker" functions spawned by the REST handlers. Each job
//! reports progress through the session store's status channel, converts
//! every collaborator failure into a status string, and clears the session's
//! processing flag on every exit path.

use crate::web::state::AppState;
use doc_chat_core::domain::{ChatMessage, MessageRole};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Status recorded after a successful upload job.
pub const FILE_READY_STATUS: &str = "File processed successfully. You can now ask questions.";
/// Status recorded after a successful answer job.
pub const ANSWER_READY_STATUS: &str = "Answer generated successfully.";

//=========================================================================================
// JobRunner (Bounded Worker Pool)
//=========================================================================================

/// Runs the background jobs behind a bounded worker pool.
///
/// Handlers stay fire-and-forget: `spawn` returns immediately and the job
/// waits for a free worker slot inside its own task, so a burst of sessions
/// queues instead of flooding the runtime. A panic inside a job is caught
/// and logged instead of disappearing with a detached task.
pub struct JobRunner {
    permits: Arc<Semaphore>,
}

impl JobRunner {
    /// Creates a runner allowing at most `max_concurrent_jobs` jobs in flight.
    pub fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent_jobs)),
        }
    }

    /// Enqueues `job` and returns immediately.
    pub fn spawn<F>(&self, label: &'static str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            // The semaphore lives as long as the runner; acquisition only
            // fails once it is closed during shutdown.
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let started = Instant::now();
            match tokio::spawn(job).await {
                Ok(()) => {
                    debug!(job = label, elapsed = ?started.elapsed(), "Background job finished");
                }
                Err(e) => {
                    error!(job = label, "Background job panicked: {e}");
                }
            }
        });
    }
}

/// Extracts the text of an uploaded PDF into the session.
pub async fn process_pdf(app_state: Arc<AppState>, token: Uuid, path: PathBuf) {
    info!(%token, path = %path.display(), "PDF processing job started");

    match app_state.pdf_adapter.extract_text(&path).await {
        Ok(text) => match app_state.store.set_document(token, text, None).await {
            Ok(()) => {
                info!(%token, "PDF processed");
                app_state.store.set_status(token, FILE_READY_STATUS).await;
            }
            Err(e) => {
                error!(%token, "Failed to store extracted text: {e}");
                app_state
                    .store
                    .set_status(token, &format!("Error processing PDF: {e}"))
                    .await;
            }
        },
        Err(e) => {
            error!(%token, "PDF extraction failed: {e}");
            app_state
                .store
                .set_status(token, &format!("Error processing PDF: {e}"))
                .await;
        }
    }

    app_state.store.clear_processing(token).await;
}

/// Extracts and transcribes the audio track of an uploaded video into the
/// session, keeping the time-coded segments alongside the full text.
pub async fn process_video(app_state: Arc<AppState>, token: Uuid, path: PathBuf) {
    info!(%token, path = %path.display(), "Video processing job started");

    let audio_path = match app_state
        .audio_adapter
        .extract_audio(&path, &app_state.config.upload_dir_temp)
        .await
    {
        Ok(audio_path) => audio_path,
        Err(e) => {
            error!(%token, "Audio extraction failed: {e}");
            app_state
                .store
                .set_status(token, &format!("Error processing video: {e}"))
                .await;
            app_state.store.clear_processing(token).await;
            return;
        }
    };

    let transcription = app_state.transcribe_adapter.transcribe(&audio_path).await;

    // The temporary audio file is removed on both outcomes; a leftover is
    // only worth a warning.
    if let Err(e) = tokio::fs::remove_file(&audio_path).await {
        warn!(path = %audio_path.display(), "Failed to remove temporary audio file: {e}");
    }

    match transcription {
        Ok(transcription) => {
            match app_state
                .store
                .set_document(token, transcription.text, Some(transcription.segments))
                .await
            {
                Ok(()) => {
                    info!(%token, "Video processed");
                    app_state.store.set_status(token, FILE_READY_STATUS).await;
                }
                Err(e) => {
                    error!(%token, "Failed to store transcription: {e}");
                    app_state
                        .store
                        .set_status(token, &format!("Error processing video: {e}"))
                        .await;
                }
            }
        }
        Err(e) => {
            error!(%token, "Transcription failed: {e}");
            app_state
                .store
                .set_status(token, &format!("Error processing video: {e}"))
                .await;
        }
    }

    app_state.store.clear_processing(token).await;
}

/// Generates an answer to `question` from the session's extracted text and
/// appends it to the transcript.
///
/// Failures are surfaced twice: as an error status, and as a visible
/// assistant message, so the user sees them without inspecting `/status`.
pub async fn generate_answer(app_state: Arc<AppState>, token: Uuid, question: String) {
    info!(%token, "Answer generation job started");

    let context = match app_state.store.get(token).await {
        Ok(session) => session.extracted_text,
        Err(e) => {
            error!(%token, "Session disappeared mid-answer: {e}");
            app_state.store.clear_processing(token).await;
            return;
        }
    };

    match app_state.qa_adapter.answer_question(&question, &context).await {
        Ok(answer) => {
            let appended = app_state
                .store
                .append_message(
                    token,
                    ChatMessage {
                        role: MessageRole::Assistant,
                        content: answer,
                    },
                )
                .await;
            match appended {
                Ok(()) => {
                    info!(%token, "Answer generated");
                    app_state.store.set_status(token, ANSWER_READY_STATUS).await;
                }
                Err(e) => {
                    error!(%token, "Failed to append answer: {e}");
                    app_state
                        .store
                        .set_status(token, &format!("Error generating answer: {e}"))
                        .await;
                }
            }
        }
        Err(e) => {
            error!(%token, "Answer generation failed: {e}");
            app_state
                .store
                .set_status(token, &format!("Error generating answer: {e}"))
                .await;

            let apology = format!(
                "Sorry, I encountered an error while processing your question: {e}"
            );
            if let Err(e) = app_state
                .store
                .append_message(
                    token,
                    ChatMessage {
                        role: MessageRole::Assistant,
                        content: apology,
                    },
                )
                .await
            {
                error!(%token, "Failed to append error message: {e}");
            }
        }
    }

    app_state.store.clear_processing(token).await;
}
