//! ============================================================================
//! Memory Configuration
//! ============================================================================
//! Capacity limits and storage naming for the session buffer and archive.
//! Values come from `Default`, optionally overlaid with MODBOT_* env vars.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Default durable-tier key
pub const DEFAULT_STORAGE_KEY: &str = "modbot-conversations";

/// Recognized memory options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryConfig {
    /// Messages kept in the per-session buffer
    pub max_session_messages: usize,
    /// Unpinned conversations kept in the archive (pinned ones don't count)
    pub max_stored_conversations: usize,
    /// Messages kept per conversation, most recent first
    pub max_messages_per_conversation: usize,
    /// Save the active conversation after every exchange
    pub auto_save: bool,
    /// Durable-tier key holding the archive
    pub storage_key: String,
    /// Session messages prepended when building model context
    pub session_context_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_session_messages: 100,
            max_stored_conversations: 50,
            max_messages_per_conversation: 1000,
            auto_save: true,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            session_context_window: 6,
        }
    }
}

impl MemoryConfig {
    /// Defaults overlaid with any MODBOT_* environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparsable values are
    /// logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        overlay(&lookup, "MODBOT_MAX_SESSION_MESSAGES", &mut config.max_session_messages);
        overlay(
            &lookup,
            "MODBOT_MAX_STORED_CONVERSATIONS",
            &mut config.max_stored_conversations,
        );
        overlay(
            &lookup,
            "MODBOT_MAX_MESSAGES_PER_CONVERSATION",
            &mut config.max_messages_per_conversation,
        );
        overlay(
            &lookup,
            "MODBOT_SESSION_CONTEXT_WINDOW",
            &mut config.session_context_window,
        );

        if let Some(raw) = lookup("MODBOT_AUTO_SAVE") {
            match parse_flag(&raw) {
                Some(flag) => config.auto_save = flag,
                None => warn!("Ignoring MODBOT_AUTO_SAVE={:?}: expected a boolean", raw),
            }
        }

        if let Some(key) = lookup("MODBOT_STORAGE_KEY") {
            let key = key.trim();
            if key.is_empty() {
                warn!("Ignoring empty MODBOT_STORAGE_KEY");
            } else {
                config.storage_key = key.to_string();
            }
        }

        config
    }
}

fn overlay<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!("Ignoring {}={:?}: not a valid number", key, raw),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = MemoryConfig::default();
        assert_eq!(config.max_session_messages, 100);
        assert_eq!(config.max_stored_conversations, 50);
        assert_eq!(config.max_messages_per_conversation, 1000);
        assert!(config.auto_save);
        assert_eq!(config.storage_key, "modbot-conversations");
        assert_eq!(config.session_context_window, 6);
    }

    #[test]
    fn test_config_env_overlay() {
        let config = MemoryConfig::from_lookup(lookup_from(&[
            ("MODBOT_MAX_SESSION_MESSAGES", "20"),
            ("MODBOT_MAX_STORED_CONVERSATIONS", " 5 "),
            ("MODBOT_AUTO_SAVE", "off"),
            ("MODBOT_STORAGE_KEY", "work-chats"),
        ]));

        assert_eq!(config.max_session_messages, 20);
        assert_eq!(config.max_stored_conversations, 5);
        assert!(!config.auto_save);
        assert_eq!(config.storage_key, "work-chats");
        assert_eq!(config.max_messages_per_conversation, 1000);
    }

    #[test]
    fn test_config_ignores_bad_values() {
        let config = MemoryConfig::from_lookup(lookup_from(&[
            ("MODBOT_MAX_SESSION_MESSAGES", "lots"),
            ("MODBOT_AUTO_SAVE", "maybe"),
            ("MODBOT_STORAGE_KEY", "   "),
        ]));

        assert_eq!(config, MemoryConfig::default());
    }

    #[test]
    fn test_config_serde_uses_camel_case_and_defaults() {
        let config: MemoryConfig =
            serde_json::from_str(r#"{"maxStoredConversations": 2, "autoSave": false}"#).unwrap();
        assert_eq!(config.max_stored_conversations, 2);
        assert!(!config.auto_save);
        assert_eq!(config.max_session_messages, 100);

        let json = serde_json::to_string(&MemoryConfig::default()).unwrap();
        assert!(json.contains("\"maxMessagesPerConversation\":1000"));
    }
}
