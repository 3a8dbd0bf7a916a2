//! Core state machines for chatwire.
//!
//! Everything here is Sans-IO: methods take the current time as a parameter
//! and return actions for a driver to execute. No sockets, no timers, no
//! runtime. That keeps the reconnect and debounce logic testable with
//! synthetic instants.
//!
//! # Components
//!
//! - [`Connection`]: connect / reconnect lifecycle with capped backoff
//! - [`ReconnectPolicy`]: backoff schedule and attempt budget
//! - [`TypingDebounce`]: collapses keystroke bursts into typing start/stop
//! - [`Endpoint`]: socket address derived from the hosting page
//! - [`env::Environment`]: time source for drivers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backoff;
pub mod connection;
pub mod endpoint;
pub mod env;
pub mod error;
pub mod typing;

pub use backoff::ReconnectPolicy;
pub use connection::{CloseReason, Connection, ConnectionAction, ConnectionState, ConnectionStatus};
pub use endpoint::Endpoint;
pub use error::ConnectionError;
pub use typing::TypingDebounce;
