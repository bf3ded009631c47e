//! services/api/src/adapters/answer_llm.rs
//!
//! This module contains the adapter for the question-answering language
//! model. It implements the `QuestionAnsweringService` port from the `core`
//! crate against a locally-hosted Ollama server.

const PROMPT_TEMPLATE: &str = r#"Act as a chatbot and answer the user's question based on the following content.

Content:
---
{content}
---

Question: {question}

Make sure and NEVER forget to provide a detailed answer in HTML format with proper formatting.
Use headings, paragraphs, bullet points, and bold text (using <b></b>) where appropriate."#;

use async_trait::async_trait;
use doc_chat_core::ports::{PortError, PortResult, QuestionAnsweringService};
use serde::{Deserialize, Serialize};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that answers document questions through Ollama's `/api/chat`
/// endpoint. The prompt embeds the full extracted text plus the question as
/// a single user message.
pub struct OllamaAnswerAdapter {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaAnswerAdapter {
    /// Creates a new `OllamaAnswerAdapter` against `base_url`.
    pub fn new(http: reqwest::Client, base_url: String, model: String) -> Self {
        Self {
            http,
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    fn build_prompt(content: &str, question: &str) -> String {
        PROMPT_TEMPLATE
            .replace("{content}", content)
            .replace("{question}", question)
    }
}

//=========================================================================================
// Ollama Wire Types
//=========================================================================================

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct OllamaChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    done: bool,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

//=========================================================================================
// `QuestionAnsweringService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestionAnsweringService for OllamaAnswerAdapter {
    /// Answers a user's question based on the extracted document text.
    async fn answer_question(&self, question: &str, context: &str) -> PortResult<String> {
        let payload = OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaChatMessage {
                role: "user",
                content: Self::build_prompt(context, question),
            }],
            stream: false,
        };

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                PortError::Unexpected(format!(
                    "failed to reach Ollama at {}: {e}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaChatResponse = response.json().await.map_err(|e| {
            PortError::Unexpected(format!("failed to decode Ollama response: {e}"))
        })?;

        if !body.done {
            return Err(PortError::Unexpected(
                "Ollama response incomplete (streaming not supported)".to_string(),
            ));
        }

        Ok(body.message.content.trim().to_string())
    }
}
