//! ============================================================================
//! Memory Manager - Orchestrates the session tier and the archive
//! ============================================================================
//! High-level API the chat screens talk to: record exchanges, build model
//! context, and run a full user → model → memory round trip.
//! ============================================================================

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use super::context::ContextBuilder;
use super::session::SessionBuffer;
use super::store::ConversationStore;
use super::types::{Message, Role};
use crate::clock::{Clock, IdGenerator, SystemClock, UuidIds};
use crate::config::MemoryConfig;
use crate::db::{InMemoryStorage, StorageAdapter};
use crate::model::{collect_reply, ModelClient};
use crate::types::MemoryResult;

/// Outcome of one user → assistant round trip
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Archive id when the exchange was auto-saved
    pub conversation_id: Option<String>,
    /// Full message list including the new user and assistant messages
    pub messages: Vec<Message>,
    pub reply: Message,
}

/// Memory manager owning both tiers
pub struct ChatMemory {
    config: MemoryConfig,
    session: SessionBuffer,
    store: ConversationStore,
    context: ContextBuilder,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ChatMemory {
    /// Create a memory manager on the given storages, using wall-clock time
    /// and random ids
    pub fn new(
        config: MemoryConfig,
        ephemeral: Arc<dyn StorageAdapter>,
        durable: Arc<dyn StorageAdapter>,
    ) -> Self {
        Self::with_sources(config, ephemeral, durable, Arc::new(SystemClock), Arc::new(UuidIds))
    }

    /// Create a memory manager with explicit clock and id sources
    pub fn with_sources(
        config: MemoryConfig,
        ephemeral: Arc<dyn StorageAdapter>,
        durable: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let session = SessionBuffer::new(ephemeral, ids.as_ref(), config.max_session_messages);
        let store = ConversationStore::new(durable, &config, clock.clone(), ids.clone());
        let context = ContextBuilder::new(config.session_context_window);

        info!(
            "Memory ready (session {}, archive key {})",
            session.session_id(),
            store.storage_key()
        );

        Self {
            config,
            session,
            store,
            context,
            clock,
            ids,
        }
    }

    /// Both tiers in process memory; nothing survives a restart
    pub fn in_memory(config: MemoryConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryStorage::new()),
            Arc::new(InMemoryStorage::new()),
        )
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionBuffer {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionBuffer {
        &mut self.session
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Create a message stamped with a fresh id and the current time
    pub fn new_message(&self, role: Role, content: impl Into<String>) -> Message {
        Message::new(self.ids.next_id("msg"), role, content, self.clock.now())
    }

    pub fn build_context(&self, current: &[Message], include_session: bool) -> Vec<Message> {
        self.context.build(&self.session, current, include_session)
    }

    /// Mirror `messages` into the session tier and, with auto-save on and an
    /// assistant reply at the end, upsert them into the archive.
    ///
    /// Returns the archive id when a save happened.
    pub fn record_exchange(
        &mut self,
        conversation_id: Option<&str>,
        messages: &[Message],
    ) -> MemoryResult<Option<String>> {
        if messages.is_empty() {
            return Ok(None);
        }
        self.session.append(messages);

        let completed = messages.len() >= 2
            && messages.last().map(|m| m.role) == Some(Role::Assistant);
        if !self.config.auto_save || !completed {
            return Ok(None);
        }

        let id = self.store.save(messages, conversation_id)?;
        debug!("Auto-saved exchange into {}", id);
        Ok(Some(id))
    }

    /// Send `user_text` to the model with memory-built context, assemble the
    /// streamed reply, and record the exchange.
    ///
    /// Nothing is recorded when the model fails.
    pub async fn converse<C>(
        &mut self,
        client: &C,
        conversation_id: Option<&str>,
        messages: &[Message],
        user_text: &str,
    ) -> Result<Exchange>
    where
        C: ModelClient + ?Sized,
    {
        let user_text = user_text.trim();
        let context = self.build_context(messages, true);
        let history = ContextBuilder::to_history(&context);
        debug!(
            "Sending message with {} history turns ({} from session)",
            history.len(),
            history.len().saturating_sub(messages.len())
        );

        let user = self.new_message(Role::User, user_text);
        let fragments = client
            .stream_message(user_text, &history)
            .await
            .context("Model request failed")?;
        let content = collect_reply(fragments).await?;
        let reply = self.new_message(Role::Assistant, content);

        let mut all = messages.to_vec();
        all.push(user);
        all.push(reply.clone());

        let conversation_id = self
            .record_exchange(conversation_id, &all)
            .context("Failed to save conversation")?;

        Ok(Exchange {
            conversation_id,
            messages: all,
            reply,
        })
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
    }

    /// Forget everything: session buffer and archive
    pub fn clear_all(&mut self) -> bool {
        self.session.clear();
        self.store.clear()
    }
}
