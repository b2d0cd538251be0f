//! ============================================================================
//! Memory Module - Two-tier conversation memory for modbot
//! ============================================================================
//! Keeps an ephemeral per-session window and a durable archive of
//! conversations, and assembles deduplicated context for model calls.
//!
//! ## Architecture
//! ```text
//! UI message → SessionBuffer.append ──────────────┐
//!                    │                            │
//!                    └→ ConversationStore.save    │
//!                        (trim + pin-aware evict) │
//!                                                 ↓
//!                ContextBuilder.build(session tail ++ current, dedup)
//!                                                 ↓
//!                                  ModelClient (streamed reply)
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use modbot_core::memory::{ChatMemory, Role};
//! use modbot_core::MemoryConfig;
//!
//! let mut memory = ChatMemory::in_memory(MemoryConfig::default());
//! let question = memory.new_message(Role::User, "Hello world");
//! let answer = memory.new_message(Role::Assistant, "Hi!");
//! let id = memory.record_exchange(None, &[question, answer])?;
//! ```
//! ============================================================================

mod context;
mod manager;
mod session;
mod stats;
mod store;
mod types;

// Re-export public types
pub use context::{ContextBuilder, DEFAULT_SESSION_WINDOW};
pub use manager::{ChatMemory, Exchange};
pub use session::{SessionBuffer, DEFAULT_CONTEXT_LIMIT};
pub use stats::{summarize, ConversationStats};
pub use store::{evict, ConversationStore};
pub use types::{
    Attachment, Conversation, HistoryTurn, Message, MetaValue, Metadata, Role, SessionState,
    TITLE_MAX_CHARS,
};
