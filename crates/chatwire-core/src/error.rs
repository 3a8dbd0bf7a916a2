//! Error types for the chatwire core.
//!
//! Connection errors report misuse of the lifecycle API or a bad endpoint.
//! Socket failures are not errors here: they arrive as events and become
//! status changes.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors that can occur during connection state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Operation not allowed in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: String,
    },

    /// Hosting page URL cannot be turned into a socket address
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
