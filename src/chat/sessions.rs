//! Per-browser chat sessions.
//!
//! DESIGN
//! ======
//! A browser is identified by an opaque random token kept in a cookie. Each
//! token owns one live chat: a chat id (the archive key) and its history.
//! Nothing is persisted here. A session idle for longer than its TTL is
//! gone: the next request with its token starts over with an empty chat, and
//! the sweep for other expired sessions runs whenever that happens.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::history::{ChatHistory, ChatMessage};

pub const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

struct ChatSession {
    chat_id: Uuid,
    generation: u64,
    history: ChatHistory,
    last_seen: Instant,
}

impl ChatSession {
    fn new() -> Self {
        Self { chat_id: Uuid::new_v4(), generation: 0, history: ChatHistory::new(), last_seen: Instant::now() }
    }

    fn snapshot(&self, created: bool) -> SessionSnapshot {
        SessionSnapshot { chat_id: self.chat_id, generation: self.generation, history: self.history.clone(), created }
    }

    fn reset(&mut self, chat_id: Uuid, history: ChatHistory) {
        self.chat_id = chat_id;
        self.history = history;
        self.generation += 1;
    }
}

/// Point-in-time copy of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub chat_id: Uuid,
    /// Bumped every time the chat is cleared, switched or restarted.
    pub generation: u64,
    pub history: ChatHistory,
    /// No live session existed for the token before this call.
    pub created: bool,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, ChatSession>>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    /// TTL from `SESSION_TTL_SECS`, else twelve hours.
    #[must_use]
    pub fn from_env() -> Self {
        let secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);
        Self::new(Duration::from_secs(secs))
    }

    /// Current chat for `token`, creating an empty one if needed.
    pub async fn snapshot(&self, token: &str) -> SessionSnapshot {
        let mut sessions = self.inner.write().await;
        let (session, created) = Self::touch(&mut sessions, token, self.ttl);
        session.snapshot(created)
    }

    /// Append `messages` if the session has not moved on since `base` was taken.
    ///
    /// Returns the updated history, or `None` when the chat was cleared,
    /// switched or expired while the turn was in flight. The messages are
    /// dropped in that case.
    pub async fn append(&self, token: &str, base: &SessionSnapshot, messages: Vec<ChatMessage>) -> Option<ChatHistory> {
        let mut sessions = self.inner.write().await;
        let (session, _) = Self::touch(&mut sessions, token, self.ttl);
        if session.chat_id != base.chat_id || session.generation != base.generation {
            tracing::debug!(chat_id = %base.chat_id, current = %session.chat_id, "dropping reply for abandoned chat");
            return None;
        }
        session.history.extend(messages);
        Some(session.history.clone())
    }

    /// Empty the current chat, keeping its id.
    pub async fn clear(&self, token: &str) {
        let mut sessions = self.inner.write().await;
        let (session, _) = Self::touch(&mut sessions, token, self.ttl);
        let chat_id = session.chat_id;
        session.reset(chat_id, ChatHistory::new());
    }

    /// Switch the session to `chat_id` with the given history.
    pub async fn replace(&self, token: &str, chat_id: Uuid, history: ChatHistory) {
        let mut sessions = self.inner.write().await;
        Self::touch(&mut sessions, token, self.ttl).0.reset(chat_id, history);
    }

    /// Switch to a saved chat only if the session is still exactly as `base`
    /// left it: same chat, same generation and nothing said yet.
    pub async fn resume(&self, token: &str, base: &SessionSnapshot, chat_id: Uuid, history: ChatHistory) -> SessionSnapshot {
        let mut sessions = self.inner.write().await;
        let (session, _) = Self::touch(&mut sessions, token, self.ttl);
        if session.chat_id == base.chat_id && session.generation == base.generation && session.history.is_empty() {
            session.reset(chat_id, history);
        }
        session.snapshot(base.created)
    }

    /// Start a fresh chat and return its id.
    pub async fn start_new(&self, token: &str) -> Uuid {
        let chat_id = Uuid::new_v4();
        self.replace(token, chat_id, ChatHistory::new()).await;
        chat_id
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Live session for `token`, replacing it if its TTL has passed.
    fn touch<'a>(sessions: &'a mut HashMap<String, ChatSession>, token: &str, ttl: Duration) -> (&'a mut ChatSession, bool) {
        let live = sessions.get(token).is_some_and(|s| s.last_seen.elapsed() < ttl);
        if !live {
            let before = sessions.len();
            sessions.retain(|_, s| s.last_seen.elapsed() < ttl);
            let swept = before - sessions.len();
            if swept > 0 {
                tracing::debug!(swept, "expired chat sessions");
            }
        }
        let session = sessions.entry(token.to_string()).or_insert_with(ChatSession::new);
        session.last_seen = Instant::now();
        (session, !live)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;
