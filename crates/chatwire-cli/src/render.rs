//! One stdout line per chat event.

use chatwire_client::{ChatEvent, ChatMessage, LocalUser};

/// Render an event for the terminal.
pub fn line(event: &ChatEvent, me: &LocalUser) -> String {
    match event {
        ChatEvent::StatusChanged(status) => format!("* connection {}", status.as_str()),
        ChatEvent::MessageReceived(message) => message_line(message, me),
        ChatEvent::TypingChanged { username, is_typing: true } => {
            format!("* {username} is typing")
        },
        ChatEvent::TypingChanged { username, is_typing: false } => {
            format!("* {username} stopped typing")
        },
        ChatEvent::PresenceChanged { username, status } => format!("* {username} is {status}"),
        ChatEvent::MessageRead { message_id } => format!("* message #{message_id} read"),
        ChatEvent::ServerError { message } => format!("! server: {message}"),
        ChatEvent::DecodeFailed { error } => format!("! discarded frame: {error}"),
        ChatEvent::SendDropped { kind, reason } => format!("! {kind} not sent: {reason}"),
        ChatEvent::ReconnectScheduled { attempt, delay } => {
            format!("* reconnecting in {:.1}s (attempt {attempt})", delay.as_secs_f64())
        },
        ChatEvent::ReconnectExhausted { attempts } => {
            format!("! gave up after {attempts} attempts, /reconnect to retry")
        },
        ChatEvent::ResyncNeeded { after: Some(id) } => {
            format!("* reconnected, messages after #{id} may be missing")
        },
        ChatEvent::ResyncNeeded { after: None } => "* reconnected".to_string(),
    }
}

fn message_line(message: &ChatMessage, me: &LocalUser) -> String {
    let sender = if message.sender_id == me.user_id {
        "you".to_string()
    } else {
        message.sender_username.clone().unwrap_or_else(|| format!("user {}", message.sender_id))
    };
    format!("[#{} {}] {sender}: {}", message.id, message.created_at, message.content)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chatwire_client::{ConnectionStatus, Presence};

    use super::*;

    fn me() -> LocalUser {
        LocalUser::new(7, "olga")
    }

    fn message(sender_id: u64, sender_username: Option<&str>) -> ChatMessage {
        ChatMessage {
            id: 12,
            sender_id,
            sender_username: sender_username.map(str::to_string),
            sender_avatar_url: None,
            content: "deal".to_string(),
            created_at: "2024-05-01T10:00:00+00:00".to_string(),
            is_read: false,
        }
    }

    #[test]
    fn renders_messages() {
        insta::assert_snapshot!(
            line(&ChatEvent::MessageReceived(message(3, Some("ivan"))), &me()),
            @"[#12 2024-05-01T10:00:00+00:00] ivan: deal"
        );
        insta::assert_snapshot!(
            line(&ChatEvent::MessageReceived(message(3, None)), &me()),
            @"[#12 2024-05-01T10:00:00+00:00] user 3: deal"
        );
        insta::assert_snapshot!(
            line(&ChatEvent::MessageReceived(message(7, Some("olga"))), &me()),
            @"[#12 2024-05-01T10:00:00+00:00] you: deal"
        );
    }

    #[test]
    fn renders_status_lines() {
        insta::assert_snapshot!(
            line(&ChatEvent::StatusChanged(ConnectionStatus::Connected), &me()),
            @"* connection connected"
        );
        insta::assert_snapshot!(
            line(
                &ChatEvent::PresenceChanged { username: "ivan".to_string(), status: Presence::Offline },
                &me()
            ),
            @"* ivan is offline"
        );
        insta::assert_snapshot!(
            line(&ChatEvent::ReconnectScheduled { attempt: 2, delay: Duration::from_secs(4) }, &me()),
            @"* reconnecting in 4.0s (attempt 2)"
        );
        insta::assert_snapshot!(
            line(&ChatEvent::ResyncNeeded { after: Some(12) }, &me()),
            @"* reconnected, messages after #12 may be missing"
        );
    }

    #[test]
    fn renders_problems() {
        insta::assert_snapshot!(
            line(
                &ChatEvent::SendDropped { kind: "message", reason: "not connected".to_string() },
                &me()
            ),
            @"! message not sent: not connected"
        );
        insta::assert_snapshot!(
            line(&ChatEvent::ReconnectExhausted { attempts: 5 }, &me()),
            @"! gave up after 5 attempts, /reconnect to retry"
        );
    }
}
