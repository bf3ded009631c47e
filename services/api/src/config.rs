//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub upload_dir_pdf: PathBuf,
    pub upload_dir_video: PathBuf,
    pub upload_dir_temp: PathBuf,
    pub max_upload_bytes: usize,
    pub max_concurrent_jobs: usize,
    pub ollama_url: String,
    pub answer_model: String,
    pub transcribe_model: String,
    pub transcribe_api_base: Option<String>,
    pub openai_api_key: Option<String>,
    pub ffmpeg_path: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Upload Directories ---
        let upload_dir_pdf = std::env::var("UPLOAD_DIR_PDF")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads/pdf"));
        let upload_dir_video = std::env::var("UPLOAD_DIR_VIDEO")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads/video"));
        let upload_dir_temp = std::env::var("UPLOAD_DIR_TEMP")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads/temp"));

        let max_upload_str =
            std::env::var("MAX_UPLOAD_BYTES").unwrap_or_else(|_| "104857600".to_string());
        let max_upload_bytes = max_upload_str
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string(), e.to_string()))?;

        let max_jobs_str =
            std::env::var("MAX_CONCURRENT_JOBS").unwrap_or_else(|_| "4".to_string());
        let max_concurrent_jobs = max_jobs_str.parse::<usize>().map_err(|e| {
            ConfigError::InvalidValue("MAX_CONCURRENT_JOBS".to_string(), e.to_string())
        })?;

        // --- Load Collaborator Settings ---
        let ollama_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let answer_model =
            std::env::var("ANSWER_MODEL").unwrap_or_else(|_| "gemma3:4b".to_string());
        let transcribe_model =
            std::env::var("TRANSCRIBE_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        let transcribe_api_base = std::env::var("TRANSCRIBE_API_BASE").ok();
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let ffmpeg_path = std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());

        Ok(Self {
            bind_address,
            log_level,
            upload_dir_pdf,
            upload_dir_video,
            upload_dir_temp,
            max_upload_bytes,
            max_concurrent_jobs,
            ollama_url,
            answer_model,
            transcribe_model,
            transcribe_api_base,
            openai_api_key,
            ffmpeg_path,
        })
    }
}
