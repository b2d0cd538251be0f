//! ============================================================================
//! Session Buffer - Ephemeral per-process message window
//! ============================================================================
//! Holds the last `max_session_messages` messages under a session key that
//! is generated fresh at startup. Storage failures never escape: the
//! in-memory window stays authoritative for the life of the process.
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, error, warn};

use super::types::{Message, SessionState};
use crate::clock::IdGenerator;
use crate::db::StorageAdapter;

/// Default number of messages returned by `context`
pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

pub struct SessionBuffer {
    storage: Arc<dyn StorageAdapter>,
    session_id: String,
    max_messages: usize,
    messages: Vec<Message>,
}

impl SessionBuffer {
    /// Start a new session on the given ephemeral storage
    pub fn new(storage: Arc<dyn StorageAdapter>, ids: &dyn IdGenerator, max_messages: usize) -> Self {
        let session_id = ids.next_id("session");
        debug!("Starting session {}", session_id);

        let mut buffer = Self {
            storage,
            session_id,
            max_messages,
            messages: Vec::new(),
        };
        buffer.load();
        buffer
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the buffer with the tail of `messages` and persist it
    pub fn append(&mut self, messages: &[Message]) {
        self.messages = tail(messages, self.max_messages).to_vec();

        let payload = match serde_json::to_string(&self.messages) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to encode session {}: {}", self.session_id, e);
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.session_id, &payload) {
            error!("Failed to save to session storage: {}", e);
        } else {
            debug!(
                "Session {} holds {} messages",
                self.session_id,
                self.messages.len()
            );
        }
    }

    /// Read the session key back. Missing or unreadable data yields an
    /// empty list and leaves the in-memory window untouched.
    pub fn load(&mut self) -> Vec<Message> {
        let stored = match self.storage.get(&self.session_id) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to load from session storage: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Message>>(&stored) {
            Ok(messages) => {
                self.messages = tail(&messages, self.max_messages).to_vec();
                self.messages.clone()
            }
            Err(e) => {
                warn!("Discarding malformed session {}: {}", self.session_id, e);
                Vec::new()
            }
        }
    }

    /// Last `limit` buffered messages, oldest first
    pub fn context(&self, limit: usize) -> Vec<Message> {
        tail(&self.messages, limit).to_vec()
    }

    /// `context` with the default limit of 10
    pub fn recent(&self) -> Vec<Message> {
        self.context(DEFAULT_CONTEXT_LIMIT)
    }

    /// Empty the buffer and drop the session key
    pub fn clear(&mut self) {
        self.messages.clear();
        if let Err(e) = self.storage.remove(&self.session_id) {
            error!("Failed to clear session {}: {}", self.session_id, e);
        }
    }

    pub fn snapshot(&self) -> SessionState {
        SessionState {
            session_id: self.session_id.clone(),
            messages: self.messages.clone(),
        }
    }
}

pub(crate) fn tail<T>(items: &[T], limit: usize) -> &[T] {
    &items[items.len().saturating_sub(limit)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SequentialIds;
    use crate::db::testing::FlakyStorage;
    use crate::db::InMemoryStorage;
    use crate::memory::types::Role;
    use chrono::{TimeZone, Utc};

    fn msg(n: usize) -> Message {
        Message::new(
            format!("m{}", n),
            Role::User,
            format!("message {}", n),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn msgs(range: std::ops::Range<usize>) -> Vec<Message> {
        range.map(msg).collect()
    }

    #[test]
    fn test_append_truncates_and_persists() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut buffer = SessionBuffer::new(storage.clone(), &SequentialIds::new(), 3);
        assert_eq!(buffer.session_id(), "session-1");

        buffer.append(&msgs(0..5));
        let ids: Vec<_> = buffer.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m2", "m3", "m4"]);

        let stored = storage.get("session-1").unwrap().unwrap();
        let persisted: Vec<Message> = serde_json::from_str(&stored).unwrap();
        assert_eq!(persisted, buffer.messages());
    }

    #[test]
    fn test_append_replaces_rather_than_extends() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut buffer = SessionBuffer::new(storage, &SequentialIds::new(), 10);

        buffer.append(&msgs(0..4));
        buffer.append(&msgs(10..12));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.messages()[0].id, "m10");
    }

    #[test]
    fn test_load_reads_back_payload() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut buffer = SessionBuffer::new(storage.clone(), &SequentialIds::new(), 10);
        buffer.append(&msgs(0..3));

        buffer.messages.clear();
        let loaded = buffer.load();
        assert_eq!(loaded.len(), 3);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_load_missing_or_malformed_is_empty() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut buffer = SessionBuffer::new(storage.clone(), &SequentialIds::new(), 10);
        assert!(buffer.load().is_empty());

        storage.set(buffer.session_id(), "{not json").unwrap();
        assert!(buffer.load().is_empty());
    }

    #[test]
    fn test_context_limits() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut buffer = SessionBuffer::new(storage, &SequentialIds::new(), 50);
        buffer.append(&msgs(0..15));

        let ctx = buffer.context(4);
        let ids: Vec<_> = ctx.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m11", "m12", "m13", "m14"]);

        assert_eq!(buffer.recent().len(), DEFAULT_CONTEXT_LIMIT);
        assert_eq!(buffer.context(100).len(), 15);
        assert!(buffer.context(0).is_empty());
    }

    #[test]
    fn test_clear_removes_key() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut buffer = SessionBuffer::new(storage.clone(), &SequentialIds::new(), 10);
        buffer.append(&msgs(0..2));

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(storage.get(buffer.session_id()).unwrap(), None);
    }

    #[test]
    fn test_write_failure_keeps_memory_window() {
        let storage = Arc::new(FlakyStorage::new());
        let mut buffer = SessionBuffer::new(storage.clone(), &SequentialIds::new(), 10);
        storage.fail_writes(true);

        buffer.append(&msgs(0..3));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.context(10).len(), 3);
        assert_eq!(storage.inner.get(buffer.session_id()).unwrap(), None);

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_read_failure_is_empty() {
        let storage = Arc::new(FlakyStorage::new());
        let mut buffer = SessionBuffer::new(storage.clone(), &SequentialIds::new(), 10);
        buffer.append(&msgs(0..3));

        storage.fail_reads(true);
        assert!(buffer.load().is_empty());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_fresh_session_gets_new_key() {
        let storage = Arc::new(InMemoryStorage::new());
        let ids = SequentialIds::new();
        let mut first = SessionBuffer::new(storage.clone(), &ids, 10);
        first.append(&msgs(0..2));

        let second = SessionBuffer::new(storage, &ids, 10);
        assert_ne!(first.session_id(), second.session_id());
        assert!(second.is_empty());
    }
}
