//! ============================================================================
//! MODBOT-CORE: Conversation memory for the modbot chat front-end
//! ============================================================================
//! This crate holds everything the chat screens persist:
//! - Ephemeral session buffer and durable conversation archive
//! - Pin-aware, capacity-bounded eviction
//! - Context assembly for model calls
//! - Storage adapters (in-process and redb)
//! ============================================================================

pub mod clock;
pub mod config;
pub mod db;
pub mod memory;
pub mod model;
pub mod types;

// Re-export main types for convenience
pub use clock::{Clock, IdGenerator, ManualClock, SequentialIds, SystemClock, UuidIds};
pub use config::MemoryConfig;
pub use db::{InMemoryStorage, RedbStorage, StorageAdapter};
pub use memory::{
    ChatMemory, ContextBuilder, Conversation, ConversationStats, ConversationStore, Message,
    Role, SessionBuffer,
};
pub use model::ModelClient;
pub use types::{MemoryError, MemoryResult};
