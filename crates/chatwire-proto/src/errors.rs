//! Protocol error types.

use thiserror::Error;

/// Result alias for frame encoding and decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
///
/// Every variant is recoverable from the connection's point of view: a bad
/// frame is discarded, the socket stays up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Payload is JSON but has no string `type` field.
    #[error("frame has no string `type` discriminator")]
    MissingType,

    /// Known `type`, but the remaining fields do not match its layout.
    #[error("invalid `{kind}` frame: {reason}")]
    InvalidFields {
        /// Discriminator of the rejected frame.
        kind: String,
        /// Decoder message.
        reason: String,
    },

    /// Frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}
