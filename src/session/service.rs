//! Chat service: routes chat turns between the session store and the agency.

use super::{Message, SessionStore};
use crate::agent::CompletionAgent;
use crate::error::Result;
use crate::text::{preview, PREVIEW_CHARS};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// Outcome of a chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Session the turn was recorded in (possibly freshly created).
    pub session_id: String,
    /// The assistant message appended to the transcript.
    pub message: Message,
}

/// Keeps a session safe from eviction until the turn finishes or is cancelled.
struct TurnHold<'a> {
    store: &'a dyn SessionStore,
    session_id: String,
}

impl Drop for TurnHold<'_> {
    fn drop(&mut self) {
        self.store.end_turn(&self.session_id);
    }
}

/// Conversation front door shared by the HTTP API and the terminal chat.
pub struct ChatService {
    store: Arc<dyn SessionStore>,
    agent: Arc<dyn CompletionAgent>,
    turn_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatService {
    /// Create a chat service over a store and a completion agent.
    pub fn new(store: Arc<dyn SessionStore>, agent: Arc<dyn CompletionAgent>) -> Self {
        Self {
            store,
            agent,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new empty session.
    pub async fn create_session(&self) -> Result<String> {
        let session_id = self.store.create().await?;
        info!("Created new chat session: {}", session_id);
        Ok(session_id)
    }

    /// Record a user message, ask the agency, and record its reply.
    ///
    /// An absent or unknown session id starts a new session. If the completion
    /// fails the user message stays in the transcript and no assistant message
    /// is added.
    #[instrument(skip(self, content), fields(chars = content.len()))]
    pub async fn post_message(&self, session_id: Option<&str>, content: &str) -> Result<ChatReply> {
        info!("Processing chat request: {}", preview(content, PREVIEW_CHARS));

        let held = self.store.begin_turn(session_id).await?;
        if session_id != Some(held.as_str()) {
            info!("Created new chat session: {}", held);
        }
        let hold = TurnHold {
            store: self.store.as_ref(),
            session_id: held,
        };
        let session_id = hold.session_id.clone();

        let lock = self.turn_lock(&session_id);
        let result = {
            let _turn = lock.lock().await;
            self.run_turn(&session_id, content).await
        };
        drop(lock);
        self.release_turn_lock(&session_id);
        drop(hold);

        let message = result?;
        Ok(ChatReply {
            session_id,
            message,
        })
    }

    /// Transcript of a session in chronological order.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<Message>> {
        self.store.history(session_id).await
    }

    async fn run_turn(&self, session_id: &str, content: &str) -> Result<Message> {
        self.store.append(session_id, Message::user(content)).await?;
        debug!("Added user message to session {}", session_id);

        info!("Requesting response from agency...");
        let response = self.agent.get_completion(content).await?;
        info!("Agency response received: {}", preview(&response, PREVIEW_CHARS));

        let assistant = Message::assistant(response);
        self.store.append(session_id, assistant.clone()).await?;
        debug!("Added assistant message to session {}", session_id);

        Ok(assistant)
    }

    fn turn_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.turn_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(session_id.to_string()).or_default().clone()
    }

    /// Drop the per-session lock once no other turn is waiting on it.
    fn release_turn_lock(&self, session_id: &str) {
        let mut locks = self.turn_locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgencyError;
    use crate::session::{MemorySessionStore, Role};
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoAgent;

    #[async_trait]
    impl CompletionAgent for EchoAgent {
        async fn get_completion(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", prompt))
        }
    }

    /// Takes longer for the first prompt so concurrent turns would interleave.
    struct SlowFirstAgent;

    #[async_trait]
    impl CompletionAgent for SlowFirstAgent {
        async fn get_completion(&self, prompt: &str) -> Result<String> {
            if prompt == "first" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(format!("re: {}", prompt))
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl CompletionAgent for FailingAgent {
        async fn get_completion(&self, _prompt: &str) -> Result<String> {
            Err(AgencyError::OpenAI("invalid api key".to_string()))
        }
    }

    fn service(agent: Arc<dyn CompletionAgent>) -> ChatService {
        ChatService::new(Arc::new(MemorySessionStore::new()), agent)
    }

    #[tokio::test]
    async fn test_post_without_session_creates_one() {
        let chat = service(Arc::new(EchoAgent));
        let reply = chat.post_message(None, "hello").await.unwrap();

        assert_eq!(reply.message.content, "echo: hello");
        assert_eq!(reply.message.role, Role::Assistant);

        let history = chat.get_history(&reply.session_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].id, reply.message.id);
    }

    #[tokio::test]
    async fn test_unknown_session_id_starts_new_session() {
        let chat = service(Arc::new(EchoAgent));
        let reply = chat.post_message(Some("stale-id"), "hi").await.unwrap();
        assert_ne!(reply.session_id, "stale-id");
        assert_eq!(chat.get_history(&reply.session_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_two_turns_in_order() {
        let chat = service(Arc::new(EchoAgent));
        let first = chat.post_message(None, "one").await.unwrap();
        let second = chat
            .post_message(Some(&first.session_id), "two")
            .await
            .unwrap();
        assert_eq!(first.session_id, second.session_id);

        let contents: Vec<_> = chat
            .get_history(&first.session_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["one", "echo: one", "two", "echo: two"]);
    }

    #[tokio::test]
    async fn test_concurrent_turns_stay_paired() {
        let chat = Arc::new(service(Arc::new(SlowFirstAgent)));
        let session_id = chat.create_session().await.unwrap();

        let a = {
            let chat = chat.clone();
            let id = session_id.clone();
            tokio::spawn(async move { chat.post_message(Some(&id), "first").await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let b = {
            let chat = chat.clone();
            let id = session_id.clone();
            tokio::spawn(async move { chat.post_message(Some(&id), "second").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let contents: Vec<_> = chat
            .get_history(&session_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "re: first", "second", "re: second"]);
        assert!(chat.turn_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_turn_survives_eviction_pressure() {
        let store = Arc::new(MemorySessionStore::with_capacity_limit(Some(1)));
        let chat = Arc::new(ChatService::new(store.clone(), Arc::new(SlowFirstAgent)));

        let turn = {
            let chat = chat.clone();
            tokio::spawn(async move { chat.post_message(None, "first").await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let other = chat.create_session().await.unwrap();

        let reply = turn.await.unwrap().unwrap();
        assert_ne!(reply.session_id, other);
        let contents: Vec<_> = chat
            .get_history(&reply.session_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "re: first"]);

        // Finished turns no longer protect the session.
        chat.create_session().await.unwrap();
        assert_eq!(store.session_count().await.unwrap(), 1);
        assert!(!store.contains(&reply.session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_completion_keeps_only_user_message() {
        let chat = service(Arc::new(FailingAgent));
        let session_id = chat.create_session().await.unwrap();

        let err = chat
            .post_message(Some(&session_id), "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid api key"));

        let history = chat.get_history(&session_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_history_of_unknown_session_fails() {
        let chat = service(Arc::new(EchoAgent));
        assert!(matches!(
            chat.get_history("nope").await,
            Err(AgencyError::SessionNotFound(_))
        ));
    }
}
