//! Archive statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::Conversation;

/// Aggregate view of the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStats {
    pub total_conversations: usize,
    pub pinned_conversations: usize,
    pub total_messages: usize,
    /// Rounded to the nearest whole message; 0 for an empty archive
    pub average_messages_per_conversation: usize,
    pub oldest_updated_at: Option<DateTime<Utc>>,
    pub newest_updated_at: Option<DateTime<Utc>>,
    pub oldest_created_at: Option<DateTime<Utc>>,
}

pub fn summarize(conversations: &[Conversation]) -> ConversationStats {
    let total_conversations = conversations.len();
    let total_messages: usize = conversations.iter().map(|c| c.messages.len()).sum();

    let average_messages_per_conversation = if total_conversations > 0 {
        (total_messages as f64 / total_conversations as f64).round() as usize
    } else {
        0
    };

    ConversationStats {
        total_conversations,
        pinned_conversations: conversations.iter().filter(|c| c.is_pinned).count(),
        total_messages,
        average_messages_per_conversation,
        oldest_updated_at: conversations.iter().map(|c| c.updated_at).min(),
        newest_updated_at: conversations.iter().map(|c| c.updated_at).max(),
        oldest_created_at: conversations.iter().map(|c| c.created_at).min(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{Message, Role};
    use chrono::{Duration, TimeZone};

    fn conv(id: &str, messages: usize, pinned: bool, day: i64) -> Conversation {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Conversation {
            id: id.to_string(),
            title: id.to_string(),
            messages: (0..messages)
                .map(|n| Message::new(format!("{}-{}", id, n), Role::User, "hi", base))
                .collect(),
            created_at: base + Duration::days(day),
            updated_at: base + Duration::days(day + 1),
            is_pinned: pinned,
        }
    }

    #[test]
    fn test_empty_archive() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_conversations, 0);
        assert_eq!(stats.average_messages_per_conversation, 0);
        assert!(stats.oldest_updated_at.is_none());
        assert!(stats.newest_updated_at.is_none());
        assert!(stats.oldest_created_at.is_none());
    }

    #[test]
    fn test_counts_and_bounds() {
        let archive = vec![conv("a", 3, true, 5), conv("b", 4, false, 1), conv("c", 0, true, 9)];
        let stats = summarize(&archive);

        assert_eq!(stats.total_conversations, 3);
        assert_eq!(stats.pinned_conversations, 2);
        assert_eq!(stats.total_messages, 7);
        // 7 / 3 = 2.33
        assert_eq!(stats.average_messages_per_conversation, 2);
        assert_eq!(stats.oldest_updated_at, Some(archive[1].updated_at));
        assert_eq!(stats.newest_updated_at, Some(archive[2].updated_at));
        assert_eq!(stats.oldest_created_at, Some(archive[1].created_at));
    }

    #[test]
    fn test_average_rounds_half_up() {
        let archive = vec![conv("a", 1, false, 0), conv("b", 2, false, 0)];
        assert_eq!(summarize(&archive).average_messages_per_conversation, 2);
    }
}
