//! ============================================================================
//! Context Builder - Assembles the message window for a model call
//! ============================================================================
//! Recent session messages first, then the current conversation, with
//! duplicate ids removed (first occurrence wins, order kept).
//! ============================================================================

use std::collections::HashSet;

use super::session::SessionBuffer;
use super::types::{HistoryTurn, Message};

/// Session messages prepended by default
pub const DEFAULT_SESSION_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    session_window: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_WINDOW)
    }
}

impl ContextBuilder {
    pub fn new(session_window: usize) -> Self {
        Self { session_window }
    }

    pub fn session_window(&self) -> usize {
        self.session_window
    }

    pub fn build(
        &self,
        session: &SessionBuffer,
        current: &[Message],
        include_session: bool,
    ) -> Vec<Message> {
        let recent = if include_session {
            session.context(self.session_window)
        } else {
            Vec::new()
        };

        dedup_by_id(recent.iter().chain(current.iter()))
    }

    /// Project messages onto the `{role, content}` history shape
    pub fn to_history(messages: &[Message]) -> Vec<HistoryTurn> {
        messages.iter().map(HistoryTurn::from).collect()
    }
}

fn dedup_by_id<'a, I>(messages: I) -> Vec<Message>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.id.as_str()))
        .cloned()
        .collect()
}
