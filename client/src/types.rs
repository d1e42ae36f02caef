/// Shared wire types for the messaging layer
use serde::{Deserialize, Serialize};

/// The peer on the other side of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerUser {
    pub id: String,
    pub name: String,
}

/// Summary of one conversation (for list views and the unread badge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    /// The other party in this conversation
    pub other_user: PeerUser,
    /// Preview text of the last message; null until someone writes
    #[serde(default)]
    pub last_message: Option<String>,
    /// UTC timestamp of the last activity; some backend builds spell this
    /// `last_message_at`, so both are accepted
    #[serde(alias = "last_message_at")]
    pub last_message_time: String,
    #[serde(default)]
    pub unread_count: u32,
    /// Optional trip the conversation was started from
    #[serde(default)]
    pub trip_id: Option<String>,
}

/// One message inside a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Message body, at most 1000 characters
    pub message: String,
    /// UTC timestamp; may arrive without a zone suffix
    pub created_at: String,
    /// Computed by the backend relative to the requesting user
    pub is_mine: bool,
}

/// Full message history with one peer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub other_user: PeerUser,
}

/// Acknowledgement for a sent message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: crate::session::SessionUser,
}
