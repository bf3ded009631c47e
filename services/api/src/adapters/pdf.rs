//! services/api/src/adapters/pdf.rs
//!
//! This module contains the adapter for PDF text extraction.
//! It implements the `PdfTextExtractor` port from the `core` crate.

use async_trait::async_trait;
use doc_chat_core::ports::{PdfTextExtractor, PortError, PortResult};
use std::path::Path;

/// An adapter that implements the `PdfTextExtractor` port with the
/// `pdf-extract` crate.
#[derive(Default)]
pub struct PdfExtractAdapter;

impl PdfExtractAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PdfTextExtractor for PdfExtractAdapter {
    /// Extracts the full text of the PDF at `path`.
    ///
    /// `pdf_extract::extract_text` is synchronous and can take a while on
    /// large documents, so it runs on the blocking thread pool.
    async fn extract_text(&self, path: &Path) -> PortResult<String> {
        let path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| PortError::Unexpected(format!("PDF extraction task failed: {e}")))?
            .map_err(|e| PortError::Unexpected(format!("Failed to extract PDF text: {e}")))?;

        if text.trim().is_empty() {
            return Err(PortError::Unexpected(
                "The PDF contains no extractable text".to_string(),
            ));
        }

        Ok(text)
    }
}
