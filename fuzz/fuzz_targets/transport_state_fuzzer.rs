//! Fuzz target for the ChatTransport state machine
//!
//! # Strategy
//!
//! - Socket lifecycle: opens (only for a requested socket), closes and
//!   errors in any order, including closes for sockets already gone
//! - Time: arbitrary jumps forward, then a tick
//! - User intents: sends, keystrokes, disconnect and reconnect
//! - Inbound text: arbitrary strings mixed with well-formed peer messages
//!
//! # Invariants
//!
//! - Retries never exceed the policy budget
//! - Text is only written while the connection is open
//! - Nothing reopens a socket after disconnect until an explicit reconnect
//! - At most one reconnect timer is armed per socket

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use chatwire_client::{
    ChatEvent, ChatTransport, ClientAction, ClientEvent, CloseReason, ConnectionState, Endpoint, LocalUser,
    TransportConfig,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum TransportOp {
    Opened,
    Closed,
    Error,
    Text(String),
    PeerMessage { id: u16, sender_id: u8 },
    Advance { millis: u16 },
    Send(String),
    Keystroke,
    Submit(String),
    Disconnect,
    Reconnect,
}

fuzz_target!(|ops: Vec<TransportOp>| {
    let config = TransportConfig::default();
    let max_attempts = config.reconnect.max_attempts;
    let (mut transport, _) = ChatTransport::<Duration>::open(
        config,
        LocalUser::new(1, "me"),
        Endpoint::new(true, "fuzz.example", 1),
    );
    let mut now = Duration::ZERO;
    let mut socket = true;
    let mut scheduled = 0usize;
    let mut opened = 1usize;

    for op in ops {
        let was_open = transport.connection_state() == ConnectionState::Open;

        let actions = match op {
            TransportOp::Opened if socket => transport.handle(ClientEvent::SocketOpened, now),
            TransportOp::Opened => vec![],
            TransportOp::Closed => {
                socket = false;
                transport.handle(ClientEvent::SocketClosed, now)
            },
            TransportOp::Error => {
                transport.handle(ClientEvent::SocketError { message: "fuzz".to_string() }, now)
            },
            TransportOp::Text(text) => transport.handle(ClientEvent::TextReceived(text), now),
            TransportOp::PeerMessage { id, sender_id } => {
                let text = format!(
                    r#"{{"type":"message","message":{{"id":{id},"sender_id":{sender_id},"content":"x","created_at":"t","is_read":false}}}}"#
                );
                transport.handle(ClientEvent::TextReceived(text), now)
            },
            TransportOp::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis) * 10);
                transport.handle(ClientEvent::Tick, now)
            },
            TransportOp::Send(content) => transport.send_message(&content),
            TransportOp::Keystroke => transport.input_changed(now),
            TransportOp::Submit(content) => transport.submit_input(&content),
            TransportOp::Disconnect => transport.disconnect(),
            TransportOp::Reconnect => transport.reconnect().unwrap_or_default(),
        };

        let intentional =
            transport.connection_state() == ConnectionState::Closed(CloseReason::Intentional);

        for action in &actions {
            match action {
                ClientAction::SendText(_) => {
                    assert!(was_open, "text written while not open");
                },
                ClientAction::OpenSocket { .. } => {
                    assert!(!intentional, "socket reopened after disconnect");
                    socket = true;
                    opened += 1;
                },
                ClientAction::CloseSocket => socket = false,
                ClientAction::Notify(ChatEvent::ReconnectScheduled { attempt, .. }) => {
                    assert!(*attempt <= max_attempts);
                    scheduled += 1;
                },
                ClientAction::Notify(_) => {},
            }
        }

        assert!(scheduled <= opened, "more timers than sockets");
    }
});
