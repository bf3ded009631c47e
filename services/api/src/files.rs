//! services/api/src/files.rs
//!
//! Upload classification and filesystem helpers.

use crate::config::Config;
use std::path::Path;
use uuid::Uuid;

/// The processing pipeline an uploaded file is dispatched to, derived from
/// its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Video,
}

impl UploadKind {
    /// Maps a filename onto the fixed extension allow-list. Returns `None`
    /// for anything outside it.
    pub fn from_filename(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "mp4" | "mov" | "avi" | "mkv" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Reduces an uploaded filename to a name that is safe to join to an upload
/// directory: directory components and leading dots are dropped, characters
/// outside `[A-Za-z0-9._-]` are replaced, and the extension is preserved.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim_start_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| matches!(c, '.' | '_' | '-')) {
        // Nothing recognizable survived; fall back to a generated name.
        return format!("upload-{}", Uuid::new_v4());
    }

    cleaned
}

/// Creates the PDF, video, and temporary-audio directories if absent.
pub async fn ensure_upload_dirs(config: &Config) -> std::io::Result<()> {
    for dir in [
        &config.upload_dir_pdf,
        &config.upload_dir_video,
        &config.upload_dir_temp,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}
