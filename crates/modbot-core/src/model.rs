//! ============================================================================
//! Model Client - Interface to the local language-model backend
//! ============================================================================
//! The memory core never talks to a model itself. Callers plug in anything
//! that can answer `(message, history)` with a full reply or a finite stream
//! of text fragments.
//! ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::memory::HistoryTurn;

/// A model backend (Ollama, a mock, ...)
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete reply for `message` given prior `history`
    async fn send_message(&self, message: &str, history: &[HistoryTurn]) -> Result<String>;

    /// Reply as a stream of fragments. Defaults to one fragment holding the
    /// full `send_message` reply.
    async fn stream_message(
        &self,
        message: &str,
        history: &[HistoryTurn],
    ) -> Result<BoxStream<'static, Result<String>>> {
        let reply = self.send_message(message, history).await?;
        Ok(stream::once(async move { Ok(reply) }).boxed())
    }
}

/// Concatenate streamed fragments; the first failed fragment aborts
pub async fn collect_reply(mut fragments: BoxStream<'_, Result<String>>) -> Result<String> {
    let mut reply = String::new();
    while let Some(fragment) = fragments.next().await {
        reply.push_str(&fragment.context("Model stream failed")?);
    }
    Ok(reply)
}
