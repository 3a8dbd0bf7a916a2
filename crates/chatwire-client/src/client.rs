//! Chat transport state machine.
//!
//! The `ChatTransport` owns one conversation's connection lifecycle, frame
//! dispatch, typing debounce and read-receipt policy. It performs no I/O:
//! socket events go in through [`ChatTransport::handle`], user intents through
//! the `send_*` methods, and everything comes back as [`ClientAction`]s.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use chatwire_core::{
    Connection, ConnectionAction, ConnectionError, ConnectionState, Endpoint, TypingDebounce,
};
use chatwire_proto::{InboundFrame, MessageId, OutboundFrame};

use crate::{
    config::{LocalUser, TransportConfig},
    event::{ChatEvent, ClientAction, ClientEvent},
};

/// Real-time transport for a single conversation.
///
/// Generic over `Instant` so tests can drive it with synthetic time.
#[derive(Debug, Clone)]
pub struct ChatTransport<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    user: LocalUser,
    config: TransportConfig,
    endpoint: Endpoint,
    connection: Connection<I>,
    typing: TypingDebounce<I>,
    /// Highest message id delivered to the UI.
    last_message_id: Option<MessageId>,
    /// The socket has been open at least once.
    opened_before: bool,
}

impl<I> ChatTransport<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create the transport and begin connecting.
    ///
    /// Returns the transport and the actions that open its first socket.
    pub fn open(
        config: TransportConfig,
        user: LocalUser,
        endpoint: Endpoint,
    ) -> (Self, Vec<ClientAction>) {
        let connection = Connection::new(endpoint.url(), config.reconnect);
        let typing = TypingDebounce::new(config.typing_quiet_period);
        let mut transport = Self {
            user,
            config,
            endpoint,
            connection,
            typing,
            last_message_id: None,
            opened_before: false,
        };

        // A fresh connection is never closed, so this cannot fail
        let actions = transport.connect().unwrap_or_default();
        (transport, actions)
    }

    /// Open a socket to the conversation endpoint.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` after a terminal close; use
    ///   [`ChatTransport::reconnect`]
    pub fn connect(&mut self) -> Result<Vec<ClientAction>, ConnectionError> {
        let actions = self.connection.connect()?;
        Ok(Self::lift(actions))
    }

    /// Process a socket or timer event.
    pub fn handle(&mut self, event: ClientEvent, now: I) -> Vec<ClientAction> {
        match event {
            ClientEvent::SocketOpened => {
                let mut actions = Self::lift(self.connection.handle_open());
                if self.connection.is_open() {
                    if self.opened_before {
                        actions.push(ClientAction::Notify(ChatEvent::ResyncNeeded {
                            after: self.last_message_id,
                        }));
                    }
                    self.opened_before = true;
                }
                actions
            },
            ClientEvent::TextReceived(text) => self.handle_text(&text),
            ClientEvent::SocketClosed => {
                self.typing.reset();
                Self::lift(self.connection.handle_close(now))
            },
            ClientEvent::SocketError { message } => {
                tracing::warn!(%message, "chat socket error");
                Self::lift(self.connection.handle_error())
            },
            ClientEvent::Tick => {
                let mut actions = Self::lift(self.connection.tick(now));
                if let Some(is_typing) = self.typing.tick(now) {
                    actions.extend(self.send_typing_indicator(is_typing));
                }
                actions
            },
        }
    }

    /// Send a frame if the socket is open; drop it with a warning otherwise.
    ///
    /// Nothing is queued or retried across reconnects.
    pub fn send(&self, frame: OutboundFrame) -> Vec<ClientAction> {
        let kind = frame.kind();

        if !self.connection.is_open() {
            tracing::warn!(kind, "chat socket not connected, dropping frame");
            return vec![ClientAction::Notify(ChatEvent::SendDropped {
                kind,
                reason: "not connected".to_string(),
            })];
        }

        match frame.encode() {
            Ok(text) => vec![ClientAction::SendText(text)],
            Err(e) => {
                tracing::warn!(kind, error = %e, "dropping unencodable frame");
                vec![ClientAction::Notify(ChatEvent::SendDropped { kind, reason: e.to_string() })]
            },
        }
    }

    /// Send a chat message. Surrounding whitespace is trimmed; blank input is
    /// ignored.
    pub fn send_message(&self, content: &str) -> Vec<ClientAction> {
        let content = content.trim();
        if content.is_empty() {
            return vec![];
        }

        let chars = content.chars().count();
        if chars > self.config.max_content_chars {
            tracing::warn!(chars, limit = self.config.max_content_chars, "message too long");
            return vec![ClientAction::Notify(ChatEvent::SendDropped {
                kind: "message",
                reason: format!(
                    "message is {chars} characters, limit is {}",
                    self.config.max_content_chars
                ),
            })];
        }

        self.send(OutboundFrame::Message { content: content.to_string() })
    }

    /// Send the local typing state.
    pub fn send_typing_indicator(&self, is_typing: bool) -> Vec<ClientAction> {
        self.send(OutboundFrame::Typing { is_typing })
    }

    /// Acknowledge a message as read.
    pub fn send_read_receipt(&self, message_id: MessageId) -> Vec<ClientAction> {
        self.send(OutboundFrame::Read { message_id })
    }

    /// Input field changed. Sends `typing: true` at the start of a burst and
    /// refreshes the quiet timer.
    pub fn input_changed(&mut self, now: I) -> Vec<ClientAction> {
        match self.typing.keystroke(now) {
            Some(is_typing) => self.send_typing_indicator(is_typing),
            None => vec![],
        }
    }

    /// User submitted the input field: send the message, then end typing
    /// immediately instead of waiting for the quiet timer.
    pub fn submit_input(&mut self, content: &str) -> Vec<ClientAction> {
        if content.trim().is_empty() {
            return vec![];
        }

        let mut actions = self.send_message(content);
        self.typing.reset();
        actions.extend(self.send_typing_indicator(false));
        actions
    }

    /// Close the socket for good. No automatic reconnect follows.
    pub fn disconnect(&mut self) -> Vec<ClientAction> {
        self.typing.reset();
        Self::lift(self.connection.disconnect())
    }

    /// Explicit recovery after the retry budget ran out, or to skip a backoff
    /// wait.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` while a socket is outstanding
    pub fn reconnect(&mut self) -> Result<Vec<ClientAction>, ConnectionError> {
        let actions = self.connection.reconnect()?;
        Ok(Self::lift(actions))
    }

    /// Time until the next timer needs a [`ClientEvent::Tick`]. `None` when
    /// no timer is armed.
    pub fn poll_timeout(&self, now: I) -> Option<Duration> {
        match (self.connection.time_until_reconnect(now), self.typing.time_until_quiet(now)) {
            (Some(reconnect), Some(quiet)) => Some(reconnect.min(quiet)),
            (reconnect, quiet) => reconnect.or(quiet),
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Local participant.
    pub fn user(&self) -> &LocalUser {
        &self.user
    }

    /// Conversation endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Highest message id delivered so far.
    pub fn last_message_id(&self) -> Option<MessageId> {
        self.last_message_id
    }

    /// Whether the local user is marked as typing.
    pub fn is_typing(&self) -> bool {
        self.typing.is_typing()
    }

    fn handle_text(&mut self, text: &str) -> Vec<ClientAction> {
        let frame = match InboundFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "discarding undecodable chat frame");
                return vec![ClientAction::Notify(ChatEvent::DecodeFailed { error: e.to_string() })];
            },
        };

        match frame {
            InboundFrame::Message { message } => {
                self.last_message_id =
                    Some(self.last_message_id.map_or(message.id, |last| last.max(message.id)));

                let acknowledge =
                    self.config.auto_read_receipts && message.sender_id != self.user.user_id;
                let message_id = message.id;

                let mut actions = vec![ClientAction::Notify(ChatEvent::MessageReceived(message))];
                if acknowledge {
                    actions.extend(self.send_read_receipt(message_id));
                }
                actions
            },
            InboundFrame::Typing { username, is_typing } => {
                vec![ClientAction::Notify(ChatEvent::TypingChanged { username, is_typing })]
            },
            InboundFrame::Status { username, status } => {
                vec![ClientAction::Notify(ChatEvent::PresenceChanged { username, status })]
            },
            InboundFrame::Read { message_id } => {
                vec![ClientAction::Notify(ChatEvent::MessageRead { message_id })]
            },
            InboundFrame::Error { message } => {
                tracing::error!(%message, "chat server error");
                vec![ClientAction::Notify(ChatEvent::ServerError { message })]
            },
            InboundFrame::Unrecognized { kind } => {
                tracing::debug!(%kind, "ignoring unrecognized chat frame");
                vec![]
            },
        }
    }

    /// Translate connection actions into driver actions.
    fn lift(actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
        actions
            .into_iter()
            .map(|action| match action {
                ConnectionAction::Open { url } => {
                    tracing::info!(%url, "opening chat socket");
                    ClientAction::OpenSocket { url }
                },
                ConnectionAction::Close => ClientAction::CloseSocket,
                ConnectionAction::Status(status) => {
                    ClientAction::Notify(ChatEvent::StatusChanged(status))
                },
                ConnectionAction::ReconnectScheduled { attempt, delay } => {
                    tracing::info!(attempt, ?delay, "chat reconnect scheduled");
                    ClientAction::Notify(ChatEvent::ReconnectScheduled { attempt, delay })
                },
                ConnectionAction::GaveUp { attempts } => {
                    tracing::warn!(attempts, "chat reconnect attempts exhausted");
                    ClientAction::Notify(ChatEvent::ReconnectExhausted { attempts })
                },
            })
            .collect()
    }
}
