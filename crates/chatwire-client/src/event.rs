//! Transport events and actions.

use std::time::Duration;

use chatwire_core::ConnectionStatus;
use chatwire_proto::{ChatMessage, MessageId, Presence};

/// Events the driver feeds into the transport.
///
/// The driver is responsible for:
/// - Reporting socket lifecycle and inbound text
/// - Driving time forward via ticks when [`crate::ChatTransport::poll_timeout`]
///   elapses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Socket handshake completed.
    SocketOpened,

    /// Text frame received.
    TextReceived(String),

    /// Socket closed, cleanly or not. Always delivered after a failure.
    SocketClosed,

    /// Socket reported an error.
    SocketError {
        /// Driver's description of the failure.
        message: String,
    },

    /// Time tick for reconnect and typing timers.
    Tick,
}

/// Actions the transport produces for the driver to execute, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Drop any current socket and open a new one.
    OpenSocket {
        /// Socket URL.
        url: String,
    },

    /// Write a text frame to the open socket.
    SendText(String),

    /// Close the current socket.
    CloseSocket,

    /// Deliver an event to the UI layer.
    Notify(ChatEvent),
}

/// Events surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Connection status changed.
    StatusChanged(ConnectionStatus),

    /// A message was posted to the conversation.
    MessageReceived(ChatMessage),

    /// A remote participant started or stopped typing.
    TypingChanged {
        /// Who.
        username: String,
        /// New typing state.
        is_typing: bool,
    },

    /// A remote participant's presence changed.
    PresenceChanged {
        /// Who.
        username: String,
        /// New presence.
        status: Presence,
    },

    /// A message was marked read.
    MessageRead {
        /// Which message.
        message_id: MessageId,
    },

    /// The server reported a problem with something we sent.
    ServerError {
        /// Server's description.
        message: String,
    },

    /// An inbound frame could not be decoded and was discarded.
    DecodeFailed {
        /// Decoder error.
        error: String,
    },

    /// An outbound frame was dropped without being sent.
    SendDropped {
        /// Discriminator of the dropped frame.
        kind: &'static str,
        /// Why it was dropped.
        reason: String,
    },

    /// A reconnect is scheduled.
    ReconnectScheduled {
        /// 1-indexed retry number.
        attempt: u32,
        /// Time until the retry.
        delay: Duration,
    },

    /// Automatic reconnects are exhausted; only an explicit reconnect helps.
    ReconnectExhausted {
        /// Retries made.
        attempts: u32,
    },

    /// The socket reopened after an outage; messages may have been missed.
    ResyncNeeded {
        /// Highest message id delivered before the outage. `None` if no
        /// message was delivered yet.
        after: Option<MessageId>,
    },
}
