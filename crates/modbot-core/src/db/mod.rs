// ============================================================================
// Storage Adapters — key/value capability behind both memory tiers
// ============================================================================
// The session buffer and the conversation archive only ever see a
// `StorageAdapter`. Two lifetimes are provided:
//   - InMemoryStorage: ephemeral, dies with the process (session tier)
//   - RedbStorage:     durable, ~/.modbot/memory.redb (override via MODBOT_DB_PATH)
// ============================================================================

mod ephemeral;
mod redb_store;

pub use ephemeral::InMemoryStorage;
pub use redb_store::{RedbStorage, DEFAULT_DB_FILE, DEFAULT_DB_PATH_ENV};

use std::sync::Arc;

use crate::types::MemoryResult;

/// String-valued key/value store.
///
/// Implementations report every failure as a `MemoryError`; the memory tiers
/// decide whether to degrade or propagate.
pub trait StorageAdapter: Send + Sync {
    fn get(&self, key: &str) -> MemoryResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> MemoryResult<()>;

    fn remove(&self, key: &str) -> MemoryResult<()>;
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for Arc<T> {
    fn get(&self, key: &str) -> MemoryResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> MemoryResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> MemoryResult<()> {
        (**self).remove(key)
    }
}
