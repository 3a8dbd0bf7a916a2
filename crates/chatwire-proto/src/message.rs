//! Chat message and presence payloads.

use serde::{Deserialize, Serialize};

/// Server-assigned message identifier.
pub type MessageId = u64;

/// Account identifier of a conversation participant.
pub type UserId = u64;

/// Conversation identifier, embedded in the socket path.
pub type ConversationId = u64;

/// Longest message body the server accepts, in characters.
///
/// Longer messages are silently discarded server-side, so the client refuses
/// to send them.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// A chat message as broadcast by the server.
///
/// Ownership passes to the display layer on delivery; the transport only
/// remembers the highest `id` it has seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server-assigned identifier.
    pub id: MessageId,
    /// Author of the message.
    pub sender_id: UserId,
    /// Author's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    /// Author's avatar, if they uploaded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_avatar_url: Option<String>,
    /// Message body.
    pub content: String,
    /// Creation timestamp, ISO-8601 as produced by the server.
    pub created_at: String,
    /// Whether the recipient has read the message.
    #[serde(default)]
    pub is_read: bool,
}

/// Presence of a remote participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Participant has an open socket on the conversation.
    Online,
    /// Participant's last socket closed.
    Offline,
}

impl Presence {
    /// Wire name of the presence value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
