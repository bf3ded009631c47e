//! services/api/src/adapters/session_store.rs
//!
//! The in-memory implementation of the `SessionStore` port.
//!
//! Sessions live for the lifetime of the process: there is no expiry and no
//! persistence, so a restart loses all chat and document state. That also
//! means the map grows without bound as new browsers show up.

use async_trait::async_trait;
use doc_chat_core::domain::{ChatMessage, ChatSession, TranscriptSegment};
use doc_chat_core::ports::{PortError, PortResult, SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_STATUS: &str = "Ready";

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, ChatSession>,
    statuses: HashMap<Uuid, String>,
}

/// Shared, concurrency-safe session state, keyed by session token.
///
/// Request handlers and background jobs both mutate sessions through this
/// store; `begin_processing` is the single admission gate that keeps two
/// background jobs from racing on one session.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<StoreInner>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, token: Uuid) -> ChatSession {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .entry(token)
            .or_insert_with(ChatSession::new)
            .clone()
    }

    async fn get(&self, token: Uuid) -> PortResult<ChatSession> {
        self.inner
            .read()
            .await
            .sessions
            .get(&token)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("unknown session {token}")))
    }

    async fn contains(&self, token: Uuid) -> bool {
        self.inner.read().await.sessions.contains_key(&token)
    }

    async fn begin_processing(&self, token: Uuid, status: &str) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let inner = &mut *inner;
        let session = inner
            .sessions
            .get_mut(&token)
            .ok_or_else(|| PortError::NotFound(format!("unknown session {token}")))?;

        if session.is_processing {
            return Err(PortError::Busy(
                "a background job is already running for this session".to_string(),
            ));
        }

        session.is_processing = true;
        inner.statuses.insert(token, status.to_string());
        Ok(())
    }

    async fn clear_processing(&self, token: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.get_mut(&token) {
            session.is_processing = false;
        }
    }

    async fn append_message(&self, token: Uuid, message: ChatMessage) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(&token)
            .ok_or_else(|| PortError::NotFound(format!("unknown session {token}")))?;
        session.messages.push(message);
        Ok(())
    }

    async fn set_document(
        &self,
        token: Uuid,
        text: String,
        segments: Option<Vec<TranscriptSegment>>,
    ) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(&token)
            .ok_or_else(|| PortError::NotFound(format!("unknown session {token}")))?;
        session.extracted_text = text;
        session.segments = segments;
        Ok(())
    }

    async fn set_status(&self, token: Uuid, status: &str) {
        self.inner
            .write()
            .await
            .statuses
            .insert(token, status.to_string());
    }

    async fn status(&self, token: Uuid) -> String {
        self.inner
            .read()
            .await
            .statuses
            .get(&token)
            .cloned()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string())
    }
}
