//! Client
//!
//! Action-based chat transport for a single conversation. Manages the socket
//! lifecycle, dispatches inbound frames, debounces typing indicators and
//! acknowledges messages from other participants.
//!
//! # Architecture
//!
//! The transport follows the same Sans-IO and Action-Based patterns as
//! [`chatwire_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute. Everything meant for the UI arrives as
//! [`ClientAction::Notify`] carrying a [`ChatEvent`].
//!
//! # Components
//!
//! - [`ChatTransport`]: Per-conversation state machine
//! - [`TransportConfig`]: Backoff, debounce and receipt tunables
//! - [`ClientEvent`]: Events fed into the transport
//! - [`ClientAction`]: Actions produced by the transport
//! - [`ChatEvent`]: Notifications for the UI
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::spawn`]: Run a transport over a real WebSocket
//! - [`transport::ChatHandle`]: Command and event channels to the driver task

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod event;

#[cfg(feature = "transport")]
mod system_env;
#[cfg(feature = "transport")]
pub mod transport;

pub use chatwire_core::{
    CloseReason, ConnectionError, ConnectionState, ConnectionStatus, Endpoint, ReconnectPolicy,
    env::Environment,
};
pub use chatwire_proto::{ChatMessage, MessageId, OutboundFrame, Presence, UserId};
pub use client::ChatTransport;
pub use config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_CONNECT_TIMEOUT, LocalUser, TransportConfig};
pub use event::{ChatEvent, ClientAction, ClientEvent};
#[cfg(feature = "transport")]
pub use system_env::SystemEnv;
