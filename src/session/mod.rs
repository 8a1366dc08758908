//! Chat session state.
//!
//! A session is an ordered transcript of user/assistant messages keyed by an
//! opaque id. Storage sits behind [`SessionStore`] so the in-memory map can be
//! replaced by a persistent backend without touching the HTTP handlers.

mod memory;
mod service;

pub use memory::MemorySessionStore;
pub use service::{ChatReply, ChatService};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with a fresh id and the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Trait for session storage implementations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Register a new empty session and return its id.
    async fn create(&self) -> Result<String>;

    /// Whether a session with this id exists.
    async fn contains(&self, session_id: &str) -> Result<bool>;

    /// Append a message to the end of a session's transcript.
    ///
    /// Fails with `SessionNotFound` if the session does not exist.
    async fn append(&self, session_id: &str, message: Message) -> Result<()>;

    /// Full transcript in chronological order.
    ///
    /// Fails with `SessionNotFound` if the session does not exist.
    async fn history(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Hold a session open for a chat turn and return its id.
    ///
    /// An absent or unknown id creates a new session. Held sessions are never
    /// evicted; every hold must be paired with [`SessionStore::end_turn`].
    async fn begin_turn(&self, session_id: Option<&str>) -> Result<String>;

    /// Release a hold taken by [`SessionStore::begin_turn`].
    fn end_turn(&self, session_id: &str);

    /// Number of live sessions.
    async fn session_count(&self) -> Result<usize>;
}
