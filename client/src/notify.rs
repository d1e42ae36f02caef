/// Notification feed derived from unread conversations
///
/// The feed is a projection, not state: it is rebuilt wholesale from the
/// latest conversation list on every poll tick, so an entry disappears as
/// soon as the backing conversation's unread count drops to zero.
use crate::timefmt::parse_utc;
use crate::types::Conversation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix that ties a feed entry back to its conversation
pub const CHAT_ID_PREFIX: &str = "chat_";

/// Preview length in the notification feed
const FEED_PREVIEW_LEN: usize = 40;

/// Preview length in conversation list rows
const LIST_PREVIEW_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Chat,
}

/// One entry in the unified notification feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Synthesized id: `chat_<conversation_id>`
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    /// "<peer>: <preview>"
    pub message: String,
    /// Raw backend timestamp of the conversation's last activity
    pub time: String,
    pub unread: bool,
    /// Where opening the entry should navigate: `/chat/<peer_id>`
    pub action_url: String,
    pub count: u32,
}

/// Rebuild the feed from a conversation list: unread conversations only,
/// newest first.
pub fn aggregate(conversations: &[Conversation]) -> Vec<Notification> {
    let mut feed: Vec<Notification> = conversations
        .iter()
        .filter(|conv| conv.unread_count > 0)
        .map(|conv| Notification {
            id: format!("{}{}", CHAT_ID_PREFIX, conv.conversation_id),
            kind: NotificationKind::Chat,
            title: "New message".to_string(),
            message: format!(
                "{}: {}",
                conv.other_user.name,
                feed_preview(conv.last_message.as_deref())
            ),
            time: conv.last_message_time.clone(),
            unread: true,
            action_url: format!("/chat/{}", conv.other_user.id),
            count: conv.unread_count,
        })
        .collect();

    feed.sort_by_key(|n| std::cmp::Reverse(sort_key(&n.time)));
    feed
}

fn sort_key(raw: &str) -> DateTime<Utc> {
    parse_utc(raw).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Conversation id embedded in a feed entry, if it is a chat entry.
pub fn conversation_id(notification: &Notification) -> Option<&str> {
    notification.id.strip_prefix(CHAT_ID_PREFIX)
}

/// Preview used in the notification feed: 40 chars, ellipsized.
pub fn feed_preview(last_message: Option<&str>) -> String {
    truncate_preview(last_message, FEED_PREVIEW_LEN, "New conversation started")
}

/// Preview used in conversation list rows: 50 chars, ellipsized.
pub fn list_preview(last_message: Option<&str>) -> String {
    truncate_preview(last_message, LIST_PREVIEW_LEN, "No messages yet")
}

fn truncate_preview(text: Option<&str>, max_chars: usize, fallback: &str) -> String {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return fallback.to_string(),
    };
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Total unread across the feed, for the badge.
pub fn total_unread(feed: &[Notification]) -> u32 {
    feed.iter().map(|n| n.count.max(1)).sum()
}

/// Badge text; anything past nine collapses to "9+".
pub fn badge_label(total: u32) -> String {
    if total > 9 {
        "9+".to_string()
    } else {
        total.to_string()
    }
}

/// Roll-up shown under the conversations view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationStats {
    pub active: usize,
    pub unread: u32,
    pub trip_related: usize,
}

pub fn stats(conversations: &[Conversation]) -> ConversationStats {
    ConversationStats {
        active: conversations.len(),
        unread: conversations.iter().map(|c| c.unread_count).sum(),
        trip_related: conversations
            .iter()
            .filter(|c| c.trip_id.is_some())
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PeerUser;

    fn conv(id: &str, unread: u32, last: Option<&str>, time: &str) -> Conversation {
        Conversation {
            conversation_id: id.to_string(),
            other_user: PeerUser {
                id: format!("user-{}", id),
                name: format!("Peer {}", id),
            },
            last_message: last.map(|s| s.to_string()),
            last_message_time: time.to_string(),
            unread_count: unread,
            trip_id: None,
        }
    }

    #[test]
    fn feed_is_exactly_the_unread_subset_sorted_desc() {
        let conversations = vec![
            conv("a", 0, Some("seen"), "2024-03-01T10:00:00"),
            conv("b", 2, Some("hello"), "2024-03-01T09:00:00"),
            conv("c", 1, Some("newest"), "2024-03-02T12:00:00"),
            conv("d", 3, Some("middle"), "2024-03-01T18:00:00"),
        ];
        let feed = aggregate(&conversations);
        let ids: Vec<&str> = feed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["chat_c", "chat_d", "chat_b"]);
        assert!(feed.iter().all(|n| n.unread));
    }

    #[test]
    fn empty_last_message_falls_back() {
        let feed = aggregate(&[conv("a", 3, None, "2024-03-01T10:00:00")]);
        assert_eq!(feed[0].message, "Peer a: New conversation started");
        assert_eq!(feed[0].count, 3);

        let feed = aggregate(&[conv("b", 1, Some(""), "2024-03-01T10:00:00")]);
        assert_eq!(feed[0].message, "Peer b: New conversation started");
    }

    #[test]
    fn long_preview_is_ellipsized_at_forty_chars() {
        let long = "A".repeat(60);
        let preview = feed_preview(Some(&long));
        assert_eq!(preview, format!("{}...", "A".repeat(40)));

        // Exactly at the limit there is nothing to cut
        let exact = "B".repeat(40);
        assert_eq!(feed_preview(Some(&exact)), exact);
    }

    #[test]
    fn list_preview_has_its_own_limit_and_fallback() {
        assert_eq!(list_preview(None), "No messages yet");
        let long = "C".repeat(51);
        assert_eq!(list_preview(Some(&long)), format!("{}...", "C".repeat(50)));
    }

    #[test]
    fn conversation_id_strips_the_prefix() {
        let feed = aggregate(&[conv("42", 1, Some("hi"), "2024-03-01T10:00:00")]);
        assert_eq!(conversation_id(&feed[0]), Some("42"));
    }

    #[test]
    fn naive_and_suffixed_timestamps_sort_together() {
        let conversations = vec![
            conv("early", 1, Some("x"), "2024-03-01T08:00:00Z"),
            conv("late", 1, Some("y"), "2024-03-01T09:00:00"),
        ];
        let feed = aggregate(&conversations);
        assert_eq!(feed[0].id, "chat_late");
    }

    #[test]
    fn badge_totals() {
        let feed = aggregate(&[
            conv("a", 4, Some("x"), "2024-03-01T10:00:00"),
            conv("b", 7, Some("y"), "2024-03-01T11:00:00"),
        ]);
        assert_eq!(total_unread(&feed), 11);
        assert_eq!(badge_label(total_unread(&feed)), "9+");
        assert_eq!(badge_label(3), "3");
    }

    #[test]
    fn stats_roll_up() {
        let mut with_trip = conv("t", 2, Some("x"), "2024-03-01T10:00:00");
        with_trip.trip_id = Some("trip-9".to_string());
        let conversations = vec![
            with_trip,
            conv("a", 0, Some("y"), "2024-03-01T11:00:00"),
            conv("b", 5, None, "2024-03-01T12:00:00"),
        ];
        let s = stats(&conversations);
        assert_eq!(
            s,
            ConversationStats {
                active: 3,
                unread: 7,
                trip_related: 1
            }
        );
    }
}
