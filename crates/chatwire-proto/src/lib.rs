//! Chatwire wire protocol.
//!
//! Frames are UTF-8 JSON objects carrying a `type` discriminator. The client
//! sends [`OutboundFrame`]s and receives [`InboundFrame`]s; the two directions
//! share tag names (`message`, `typing`, `read`) but not field layouts, so
//! they are separate types.
//!
//! Decoding is lenient about the discriminator: a frame whose `type` is not
//! known decodes to [`InboundFrame::Unrecognized`] rather than failing, so a
//! newer server cannot break an older client.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod frame;
mod message;

pub use errors::{ProtocolError, Result};
pub use frame::{InboundFrame, OutboundFrame};
pub use message::{ChatMessage, ConversationId, MAX_CONTENT_CHARS, MessageId, Presence, UserId};
