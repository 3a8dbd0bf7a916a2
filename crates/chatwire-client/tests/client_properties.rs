//! Property-based tests for the chat transport.
//!
//! Feeds arbitrary frame streams, keystroke timings and socket lifecycles
//! through a [`ChatTransport`] and checks dispatch order, receipt placement,
//! typing alternation and the open-only send rule.

use std::time::Duration;

use chatwire_client::{
    ChatEvent, ChatMessage, ChatTransport, ClientAction, ClientEvent, ConnectionState, Endpoint,
    LocalUser, OutboundFrame, TransportConfig,
};
use proptest::prelude::*;

const ME: u64 = 1;

#[derive(Debug, Clone)]
enum Inbound {
    Message { id: u64, sender_id: u64 },
    Typing(bool),
    Status(bool),
    Read(u64),
    Unknown,
}

impl Inbound {
    fn encode(&self) -> String {
        match self {
            Self::Message { id, sender_id } => {
                let message = ChatMessage {
                    id: *id,
                    sender_id: *sender_id,
                    sender_username: Some("peer".to_string()),
                    sender_avatar_url: None,
                    content: format!("message {id}"),
                    created_at: "2024-05-01T10:00:00+00:00".to_string(),
                    is_read: false,
                };
                serde_json::json!({ "type": "message", "message": message }).to_string()
            },
            Self::Typing(is_typing) => {
                serde_json::json!({ "type": "typing", "username": "peer", "is_typing": is_typing })
                    .to_string()
            },
            Self::Status(online) => serde_json::json!({
                "type": "status",
                "username": "peer",
                "status": if *online { "online" } else { "offline" },
            })
            .to_string(),
            Self::Read(id) => serde_json::json!({ "type": "read", "message_id": id }).to_string(),
            Self::Unknown => r#"{"type":"reaction","emoji":"+1"}"#.to_string(),
        }
    }

    fn notifies(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

fn inbound_strategy() -> impl Strategy<Value = Inbound> {
    prop_oneof![
        4 => (1u64..1000, 1u64..4).prop_map(|(id, sender_id)| Inbound::Message { id, sender_id }),
        2 => any::<bool>().prop_map(Inbound::Typing),
        1 => any::<bool>().prop_map(Inbound::Status),
        2 => (1u64..1000).prop_map(Inbound::Read),
        1 => Just(Inbound::Unknown),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Opened,
    Closed,
    Advance(u64),
    Send,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::Opened),
        2 => Just(Step::Closed),
        3 => (0u64..40_000).prop_map(Step::Advance),
        4 => Just(Step::Send),
    ]
}

fn open_transport() -> ChatTransport<Duration> {
    let (mut transport, _) = ChatTransport::open(
        TransportConfig::default(),
        LocalUser::new(ME, "me"),
        Endpoint::new(false, "localhost:8000", 9),
    );
    transport.handle(ClientEvent::SocketOpened, Duration::ZERO);
    transport
}

fn sent(actions: &[ClientAction]) -> Vec<OutboundFrame> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::SendText(text) => Some(OutboundFrame::decode(text).unwrap()),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_one_notification_per_frame_in_order(
        frames in prop::collection::vec(inbound_strategy(), 0..40),
    ) {
        let mut transport = open_transport();
        let mut notified = Vec::new();

        for frame in &frames {
            let actions = transport.handle(ClientEvent::TextReceived(frame.encode()), Duration::ZERO);
            notified.extend(actions.into_iter().filter_map(|a| match a {
                ClientAction::Notify(event) => Some(event),
                _ => None,
            }));
        }

        let expected: Vec<&Inbound> = frames.iter().filter(|f| f.notifies()).collect();
        prop_assert_eq!(notified.len(), expected.len());

        for (event, frame) in notified.iter().zip(expected) {
            let matches = match (event, frame) {
                (ChatEvent::MessageReceived(m), Inbound::Message { id, .. }) => m.id == *id,
                (ChatEvent::TypingChanged { is_typing, .. }, Inbound::Typing(t)) => is_typing == t,
                (ChatEvent::PresenceChanged { .. }, Inbound::Status(_)) => true,
                (ChatEvent::MessageRead { message_id }, Inbound::Read(id)) => message_id == id,
                _ => false,
            };
            prop_assert!(matches, "{event:?} does not correspond to {frame:?}");
        }
    }

    #[test]
    fn prop_receipt_follows_peer_messages_only(
        frames in prop::collection::vec(inbound_strategy(), 0..40),
    ) {
        let mut transport = open_transport();

        for frame in &frames {
            let actions = transport.handle(ClientEvent::TextReceived(frame.encode()), Duration::ZERO);
            match frame {
                Inbound::Message { id, sender_id } if *sender_id != ME => {
                    prop_assert_eq!(actions.len(), 2);
                    prop_assert!(matches!(actions[0], ClientAction::Notify(ChatEvent::MessageReceived(_))));
                    prop_assert_eq!(sent(&actions[1..]), vec![OutboundFrame::Read { message_id: *id }]);
                },
                _ => prop_assert!(sent(&actions).is_empty()),
            }
        }
    }

    #[test]
    fn prop_typing_alternates(gaps in prop::collection::vec(0u64..2500, 1..40)) {
        let mut transport = open_transport();
        let mut now = Duration::ZERO;
        let mut frames = Vec::new();

        for gap in gaps {
            now += Duration::from_millis(gap);
            frames.extend(sent(&transport.handle(ClientEvent::Tick, now)));
            frames.extend(sent(&transport.input_changed(now)));
        }
        now += Duration::from_secs(5);
        frames.extend(sent(&transport.handle(ClientEvent::Tick, now)));

        prop_assert!(!frames.is_empty());
        for (i, frame) in frames.iter().enumerate() {
            prop_assert_eq!(frame, &OutboundFrame::Typing { is_typing: i % 2 == 0 });
        }
        prop_assert_eq!(frames.len() % 2, 0);
    }

    #[test]
    fn prop_frames_sent_only_while_open(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let (mut transport, _) = ChatTransport::open(
            TransportConfig::default(),
            LocalUser::new(ME, "me"),
            Endpoint::new(false, "localhost:8000", 9),
        );
        let mut now = Duration::ZERO;
        let mut socket = true;

        for step in &steps {
            let actions = match step {
                Step::Opened if socket => transport.handle(ClientEvent::SocketOpened, now),
                Step::Opened => vec![],
                Step::Closed => {
                    socket = false;
                    transport.handle(ClientEvent::SocketClosed, now)
                },
                Step::Advance(ms) => {
                    now += Duration::from_millis(*ms);
                    transport.handle(ClientEvent::Tick, now)
                },
                Step::Send => {
                    let open = transport.connection_state() == ConnectionState::Open;
                    let actions = transport.send_message("ping");
                    prop_assert_eq!(!sent(&actions).is_empty(), open);
                    actions
                },
            };
            if actions.iter().any(|a| matches!(a, ClientAction::OpenSocket { .. })) {
                socket = true;
            }
        }
    }
}
