//! In-memory session store.
//!
//! Sessions live for the lifetime of the process. An optional capacity bound
//! evicts the least recently active session when a new one would exceed it.
//! Sessions with a turn in flight are skipped, so the store can briefly hold
//! more than its capacity.

use super::{Message, SessionStore};
use crate::error::{AgencyError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};
use uuid::Uuid;

struct SessionEntry {
    messages: Vec<Message>,
    last_active: u64,
    active_turns: usize,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionEntry>,
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn insert_new(&mut self, max_sessions: Option<usize>) -> String {
        if let Some(max) = max_sessions {
            self.evict_idle(max);
        }

        let session_id = Uuid::new_v4().to_string();
        let last_active = self.tick();
        self.sessions.insert(
            session_id.clone(),
            SessionEntry {
                messages: Vec::new(),
                last_active,
                active_turns: 0,
            },
        );
        session_id
    }

    fn evict_idle(&mut self, max: usize) {
        while self.sessions.len() >= max {
            let oldest = self
                .sessions
                .iter()
                .filter(|(_, entry)| entry.active_turns == 0)
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                    info!("Evicted idle session {} (capacity {})", id, max);
                }
                None => {
                    warn!(
                        "All {} sessions have turns in flight, exceeding capacity {}",
                        self.sessions.len(),
                        max
                    );
                    break;
                }
            }
        }
    }
}

/// In-memory session store.
pub struct MemorySessionStore {
    inner: RwLock<Inner>,
    max_sessions: Option<usize>,
}

impl MemorySessionStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_sessions: None,
        }
    }

    /// Create a store that keeps at most `max_sessions` sessions.
    pub fn with_capacity_limit(max_sessions: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_sessions: max_sessions.filter(|&max| max > 0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> Result<String> {
        Ok(self.write().insert_new(self.max_sessions))
    }

    async fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.read().sessions.contains_key(session_id))
    }

    async fn append(&self, session_id: &str, message: Message) -> Result<()> {
        let mut inner = self.write();
        let now = inner.tick();
        let entry = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AgencyError::SessionNotFound(session_id.to_string()))?;
        entry.messages.push(message);
        entry.last_active = now;
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        self.read()
            .sessions
            .get(session_id)
            .map(|entry| entry.messages.clone())
            .ok_or_else(|| AgencyError::SessionNotFound(session_id.to_string()))
    }

    async fn begin_turn(&self, session_id: Option<&str>) -> Result<String> {
        let mut inner = self.write();
        let now = inner.tick();
        let session_id = match session_id {
            Some(id) if inner.sessions.contains_key(id) => id.to_string(),
            _ => inner.insert_new(self.max_sessions),
        };
        if let Some(entry) = inner.sessions.get_mut(&session_id) {
            entry.active_turns += 1;
            entry.last_active = now;
        }
        Ok(session_id)
    }

    fn end_turn(&self, session_id: &str) {
        if let Some(entry) = self.write().sessions.get_mut(session_id) {
            entry.active_turns = entry.active_turns.saturating_sub(1);
        }
    }

    async fn session_count(&self) -> Result<usize> {
        Ok(self.read().sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = MemorySessionStore::new();
        let id = store.create().await.unwrap();

        store.append(&id, Message::user("first")).await.unwrap();
        store.append(&id, Message::assistant("second")).await.unwrap();

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = MemorySessionStore::new();
        assert!(!store.contains("missing").await.unwrap());
        assert!(matches!(
            store.history("missing").await,
            Err(AgencyError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.append("missing", Message::user("hi")).await,
            Err(AgencyError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_active() {
        let store = MemorySessionStore::with_capacity_limit(Some(2));
        let first = store.create().await.unwrap();
        let second = store.create().await.unwrap();

        // Touch the first session so the second becomes the idlest.
        store.append(&first, Message::user("still here")).await.unwrap();

        let third = store.create().await.unwrap();
        assert_eq!(store.session_count().await.unwrap(), 2);
        assert!(store.contains(&first).await.unwrap());
        assert!(!store.contains(&second).await.unwrap());
        assert!(store.contains(&third).await.unwrap());
    }

    #[tokio::test]
    async fn test_eviction_skips_sessions_mid_turn() {
        let store = MemorySessionStore::with_capacity_limit(Some(1));
        let busy = store.begin_turn(None).await.unwrap();

        let second = store.create().await.unwrap();
        assert!(store.contains(&busy).await.unwrap());
        assert_eq!(store.session_count().await.unwrap(), 2);

        // Once the turn ends the older session is evictable again.
        store.end_turn(&busy);
        let third = store.create().await.unwrap();
        assert_eq!(store.session_count().await.unwrap(), 1);
        assert!(!store.contains(&busy).await.unwrap());
        assert!(!store.contains(&second).await.unwrap());
        assert!(store.contains(&third).await.unwrap());
    }

    #[tokio::test]
    async fn test_begin_turn_reuses_known_and_replaces_unknown_ids() {
        let store = MemorySessionStore::new();
        let id = store.create().await.unwrap();

        assert_eq!(store.begin_turn(Some(&id)).await.unwrap(), id);
        store.end_turn(&id);

        let fresh = store.begin_turn(Some("stale-id")).await.unwrap();
        assert_ne!(fresh, "stale-id");
        assert!(store.contains(&fresh).await.unwrap());
        store.end_turn(&fresh);
        store.end_turn("stale-id");
    }

    #[tokio::test]
    async fn test_unbounded_by_default() {
        let store = MemorySessionStore::with_capacity_limit(None);
        for _ in 0..50 {
            store.create().await.unwrap();
        }
        assert_eq!(store.session_count().await.unwrap(), 50);
    }
}
