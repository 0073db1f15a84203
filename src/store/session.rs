//! Session store — ephemeral per-conversation state.
//!
//! Sessions hold an append-only conversation history plus free-form
//! metadata. They are never auto-expired; deletion is always explicit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A message in a session conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// "user", "assistant" or "system".
    pub role: String,
    /// Message body.
    pub content: String,
    /// When the message was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a message stamped now.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Caller-supplied identifier.
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last time the session state was touched via `update_session`.
    ///
    /// Note: `add_message` deliberately does not refresh this — appending a
    /// message and touching session state are distinct events. See the
    /// asymmetry test below before changing.
    pub last_activity: DateTime<Utc>,
    /// Ordered conversation history.
    pub conversation: Vec<ConversationMessage>,
    /// Free-form metadata.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// In-memory session storage shared across concurrent callers.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session. Idempotent — an existing session is left untouched.
    pub async fn create_session(&self, id: impl Into<String>) {
        let id = id.into();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return;
        }

        let now = Utc::now();
        sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                created_at: now,
                last_activity: now,
                conversation: Vec::new(),
                metadata: serde_json::Map::new(),
            },
        );
        info!(session_id = %id, "Created session");
    }

    /// Fetch a session by ID.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Append a message to a session's conversation.
    ///
    /// No-op if the session does not exist — the session is NOT created as a
    /// side effect. Does not refresh `last_activity`.
    pub async fn add_message(&self, id: &str, message: ConversationMessage) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            session.conversation.push(message);
            debug!(session_id = %id, "Appended conversation message");
        }
    }

    /// Shallow-merge `patch` into the session metadata and refresh
    /// `last_activity`. No-op if the session does not exist.
    pub async fn update_session(
        &self,
        id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            for (k, v) in patch {
                session.metadata.insert(k, v);
            }
            session.last_activity = Utc::now();
            info!(session_id = %id, "Updated session");
        }
    }

    /// Conversation history for a session; empty when the session is absent.
    pub async fn get_conversation(&self, id: &str) -> Vec<ConversationMessage> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.conversation.clone())
            .unwrap_or_default()
    }

    /// Delete a session. Idempotent.
    pub async fn delete_session(&self, id: &str) {
        if self.sessions.write().await.remove(id).is_some() {
            info!(session_id = %id, "Deleted session");
        }
    }
}

// ── Conversation compaction ─────────────────────────────────────────

/// Keep only the most recent `max` messages.
pub fn compact_conversation(
    messages: &[ConversationMessage],
    max: usize,
) -> &[ConversationMessage] {
    let start = messages.len().saturating_sub(max);
    &messages[start..]
}

/// Render a brief summary of the last few messages, one line per message
/// with content truncated to 100 chars.
pub fn summarize_conversation(messages: &[ConversationMessage]) -> String {
    if messages.is_empty() {
        return "(no messages)".to_string();
    }

    compact_conversation(messages, 5)
        .iter()
        .map(|msg| {
            let content: String = if msg.content.chars().count() > 100 {
                let truncated: String = msg.content.chars().take(100).collect();
                format!("{truncated}...")
            } else {
                msg.content.clone()
            };
            format!("{}: {}", msg.role, content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
