//! Discriminated text frames.
//!
//! Every frame on the socket is a JSON object with a `type` field naming the
//! variant. Serde's internally tagged representation matches this directly,
//! so the enums below serialize to exactly what the server expects.
//!
//! # Invariants
//!
//! - Every inbound frame carries a string `type`. A frame without one is a
//!   decode error, not an unrecognized frame.
//! - Unknown `type` values are never an error. They decode to
//!   [`InboundFrame::Unrecognized`] and callers ignore them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    message::{ChatMessage, MessageId, Presence},
};

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// New chat message.
    Message {
        /// Message body, already trimmed.
        content: String,
    },
    /// Local typing state changed.
    Typing {
        /// `true` when a burst of input starts, `false` when it ends.
        is_typing: bool,
    },
    /// Read receipt for a received message.
    Read {
        /// Message being acknowledged.
        message_id: MessageId,
    },
}

impl OutboundFrame {
    /// Wire discriminator of this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Typing { .. } => "typing",
            Self::Read { .. } => "read",
        }
    }

    /// Serialize to the JSON text sent on the socket.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse a client frame. Used by servers and test peers.
    pub fn decode(text: &str) -> Result<Self> {
        let (kind, value) = split_type(text)?;
        serde_json::from_value(value)
            .map_err(|e| ProtocolError::InvalidFields { kind, reason: e.to_string() })
    }
}

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    /// A message was posted to the conversation (by anyone, including us).
    Message {
        /// The posted message.
        message: ChatMessage,
    },
    /// A remote participant started or stopped typing.
    Typing {
        /// Who is typing.
        username: String,
        /// Their new typing state.
        is_typing: bool,
    },
    /// A remote participant connected or disconnected.
    Status {
        /// Whose presence changed.
        username: String,
        /// Their new presence.
        status: Presence,
    },
    /// A message was marked read.
    Read {
        /// Message that was read.
        message_id: MessageId,
    },
    /// The server rejected something we sent.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// Frame with a `type` this client does not know.
    #[serde(skip)]
    Unrecognized {
        /// The unknown discriminator.
        kind: String,
    },
}

impl InboundFrame {
    /// Discriminators with a typed variant.
    pub const KNOWN_TYPES: [&'static str; 5] = ["message", "typing", "status", "read", "error"];

    /// Wire discriminator of this frame.
    pub fn kind(&self) -> &str {
        match self {
            Self::Message { .. } => "message",
            Self::Typing { .. } => "typing",
            Self::Status { .. } => "status",
            Self::Read { .. } => "read",
            Self::Error { .. } => "error",
            Self::Unrecognized { kind } => kind,
        }
    }

    /// Parse a server frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Malformed` if `text` is not JSON
    /// - `ProtocolError::MissingType` if there is no string `type` field
    /// - `ProtocolError::InvalidFields` if a known frame has the wrong fields
    pub fn decode(text: &str) -> Result<Self> {
        let (kind, value) = split_type(text)?;

        if !Self::KNOWN_TYPES.contains(&kind.as_str()) {
            return Ok(Self::Unrecognized { kind });
        }

        serde_json::from_value(value)
            .map_err(|e| ProtocolError::InvalidFields { kind, reason: e.to_string() })
    }

    /// Serialize to JSON text. Used by servers and test peers.
    ///
    /// # Errors
    ///
    /// `ProtocolError::Encode` for [`InboundFrame::Unrecognized`], which has no
    /// wire form.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Parse JSON and pull out the `type` discriminator.
fn split_type(text: &str) -> Result<(String, Value)> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let kind = value.get("type").and_then(Value::as_str).ok_or(ProtocolError::MissingType)?;

    Ok((kind.to_owned(), value))
}
