//! ============================================================================
//! Conversation Store - Durable archive with pin-aware eviction
//! ============================================================================
//! The archive is a single JSON array under `storage_key`. Every mutation is
//! read-modify-write over the whole snapshot; one writer per process.
//!
//! Ordering: most recently saved first. After each save the archive becomes
//! `pinned ++ first (max_stored - |pinned|) unpinned`.
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::session::tail;
use super::stats::{summarize, ConversationStats};
use super::types::{Conversation, Message};
use crate::clock::{Clock, IdGenerator};
use crate::config::MemoryConfig;
use crate::db::StorageAdapter;
use crate::types::{MemoryError, MemoryResult};

/// Keep every pinned conversation, then fill the remaining capacity with
/// unpinned ones in their current order.
pub fn evict(conversations: Vec<Conversation>, max_stored: usize) -> Vec<Conversation> {
    let (pinned, unpinned): (Vec<_>, Vec<_>) =
        conversations.into_iter().partition(|c| c.is_pinned);
    let slots = max_stored.saturating_sub(pinned.len());

    pinned
        .into_iter()
        .chain(unpinned.into_iter().take(slots))
        .collect()
}

pub struct ConversationStore {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    storage_key: String,
    max_stored: usize,
    max_messages: usize,
}

impl ConversationStore {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        config: &MemoryConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            storage,
            clock,
            ids,
            storage_key: config.storage_key.clone(),
            max_stored: config.max_stored_conversations,
            max_messages: config.max_messages_per_conversation,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    // ========================================================================
    // Snapshot I/O
    // ========================================================================

    fn read_archive(&self) -> MemoryResult<Vec<Conversation>> {
        match self.storage.get(&self.storage_key)? {
            Some(stored) => serde_json::from_str(&stored).map_err(|e| {
                MemoryError::malformed(format!("archive {}: {}", self.storage_key, e))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Archive snapshot for read paths; any failure reads as empty
    fn archive(&self) -> Vec<Conversation> {
        match self.read_archive() {
            Ok(conversations) => conversations,
            Err(e) => {
                warn!("Failed to load conversations: {}", e);
                Vec::new()
            }
        }
    }

    fn write_archive(&self, conversations: &[Conversation]) -> MemoryResult<()> {
        let payload = serde_json::to_string(conversations)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;
        self.storage.set(&self.storage_key, &payload)?;
        debug!(
            "Wrote {} conversations to {}",
            conversations.len(),
            self.storage_key
        );
        Ok(())
    }

    /// Apply `op` to one conversation and write the archive back.
    /// Returns false when the id is unknown or storage fails.
    fn update_one<F>(&self, id: &str, op: F) -> bool
    where
        F: FnOnce(&mut Conversation, &Self),
    {
        let mut conversations = match self.read_archive() {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to update conversation {}: {}", id, e);
                return false;
            }
        };

        let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) else {
            debug!("Conversation {} not found", id);
            return false;
        };
        op(conversation, self);

        match self.write_archive(&conversations) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to update conversation {}: {}", id, e);
                false
            }
        }
    }

    // ========================================================================
    // Save / Load
    // ========================================================================

    /// Upsert a conversation and apply eviction. Returns the conversation id.
    ///
    /// This is the one archive operation that reports storage failure: a
    /// lost save must be visible to the caller.
    pub fn save(&self, messages: &[Message], id: Option<&str>) -> MemoryResult<String> {
        let mut conversations = match self.read_archive() {
            Ok(c) => c,
            Err(e) if e.is_malformed() => {
                warn!("Discarding unreadable archive before save: {}", e);
                Vec::new()
            }
            Err(e) => {
                error!("Failed to save conversation: {}", e);
                return Err(e);
            }
        };

        let now = self.clock.now();
        let id = match id {
            Some(id) => id.to_string(),
            None => self.ids.next_id("conv"),
        };
        let kept = tail(messages, self.max_messages).to_vec();

        let conversation = match conversations.iter().position(|c| c.id == id) {
            Some(index) => {
                let mut existing = conversations.remove(index);
                existing.messages = kept;
                existing.updated_at = now;
                existing
            }
            None => Conversation {
                id: id.clone(),
                title: Conversation::title_for(messages, now),
                messages: kept,
                created_at: now,
                updated_at: now,
                is_pinned: false,
            },
        };
        conversations.insert(0, conversation);

        let before = conversations.len();
        let archive = evict(conversations, self.max_stored);
        if archive.len() < before {
            info!(
                "Evicted {} conversations (limit {})",
                before - archive.len(),
                self.max_stored
            );
        }

        if let Err(e) = self.write_archive(&archive) {
            error!("Failed to save conversation {}: {}", id, e);
            return Err(e);
        }

        debug!("Saved conversation {}", id);
        Ok(id)
    }

    pub fn load(&self, id: &str) -> Option<Conversation> {
        self.archive().into_iter().find(|c| c.id == id)
    }

    /// All conversations in stored order
    pub fn list_all(&self) -> Vec<Conversation> {
        self.archive()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Remove a conversation. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> bool {
        let mut conversations = match self.read_archive() {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to delete conversation {}: {}", id, e);
                return false;
            }
        };

        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        if conversations.len() == before {
            return false;
        }

        match self.write_archive(&conversations) {
            Ok(()) => {
                info!("Deleted conversation {}", id);
                true
            }
            Err(e) => {
                error!("Failed to delete conversation {}: {}", id, e);
                false
            }
        }
    }

    /// Toggle the pinned flag
    pub fn pin(&self, id: &str) -> bool {
        self.update_one(id, |conversation, _| {
            conversation.is_pinned = !conversation.is_pinned;
            debug!(
                "Conversation {} pinned = {}",
                conversation.id, conversation.is_pinned
            );
        })
    }

    pub fn rename(&self, id: &str, title: &str) -> bool {
        let title = title.trim().to_string();
        self.update_one(id, move |conversation, _| conversation.title = title)
    }

    /// Re-derive the title from the stored messages
    pub fn regenerate_title(&self, id: &str) -> bool {
        self.update_one(id, |conversation, store| {
            conversation.title = Conversation::title_for(&conversation.messages, store.clock.now());
        })
    }

    /// Drop the whole archive
    pub fn clear(&self) -> bool {
        match self.storage.remove(&self.storage_key) {
            Ok(()) => {
                info!("Cleared archive {}", self.storage_key);
                true
            }
            Err(e) => {
                error!("Failed to clear conversations: {}", e);
                false
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Case-insensitive substring search over titles and message bodies
    pub fn search(&self, query: &str) -> Vec<Conversation> {
        let query = query.to_lowercase();
        self.archive()
            .into_iter()
            .filter(|c| c.matches(&query))
            .collect()
    }

    pub fn statistics(&self) -> ConversationStats {
        summarize(&self.archive())
    }

    // ========================================================================
    // Export / Import
    // ========================================================================

    /// Pretty-printed JSON array of the archive
    pub fn export_all(&self) -> String {
        let conversations = self.archive();
        match serde_json::to_string_pretty(&conversations) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to export conversations: {}", e);
                "[]".to_string()
            }
        }
    }

    /// Replace the archive with `blob`. Nothing is written unless the whole
    /// payload is a valid list of conversations.
    pub fn import_all(&self, blob: &str) -> bool {
        let conversations = match parse_import(blob) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to import conversations: {}", e);
                return false;
            }
        };

        match self.write_archive(&conversations) {
            Ok(()) => {
                info!("Imported {} conversations", conversations.len());
                true
            }
            Err(e) => {
                error!("Failed to import conversations: {}", e);
                false
            }
        }
    }
}

fn parse_import(blob: &str) -> MemoryResult<Vec<Conversation>> {
    let value: serde_json::Value =
        serde_json::from_str(blob).map_err(|e| MemoryError::InvalidImport(e.to_string()))?;

    if !value.is_array() {
        return Err(MemoryError::InvalidImport(
            "expected a JSON array of conversations".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| MemoryError::InvalidImport(e.to_string()))
}
