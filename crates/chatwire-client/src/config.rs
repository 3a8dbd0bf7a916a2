//! Transport configuration.

use std::time::Duration;

use chatwire_core::{ReconnectPolicy, typing::DEFAULT_QUIET_PERIOD};
use chatwire_proto::{MAX_CONTENT_CHARS, UserId};

/// Time allowed for the WebSocket handshake before the attempt counts as a
/// failed connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the driver's command and event channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Tunables for a [`crate::ChatTransport`] and its driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Reconnect backoff and retry budget.
    pub reconnect: ReconnectPolicy,
    /// Input silence that ends a typing burst.
    pub typing_quiet_period: Duration,
    /// Longest message body accepted by [`crate::ChatTransport::send_message`].
    pub max_content_chars: usize,
    /// Acknowledge every message from another participant on receipt.
    pub auto_read_receipts: bool,
    /// WebSocket handshake timeout (driver only).
    pub connect_timeout: Duration,
    /// Command and event channel capacity (driver only).
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            typing_quiet_period: DEFAULT_QUIET_PERIOD,
            max_content_chars: MAX_CONTENT_CHARS,
            auto_read_receipts: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// The participant on this end of the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    /// Account id; messages from this id are never acknowledged.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
}

impl LocalUser {
    /// Create a local user.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self { user_id, username: username.into() }
    }
}
