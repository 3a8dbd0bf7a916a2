//! Stdin line parsing.
//!
//! Plain text is a message. Lines starting with `/` are commands.

use chatwire_proto::MessageId;
use thiserror::Error;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a chat message.
    Submit(String),
    /// Mark a message as read.
    Read(MessageId),
    /// Send an explicit typing indicator.
    Typing(bool),
    /// Reset the retry budget and connect now.
    Reconnect,
    /// Disconnect and exit.
    Quit,
}

/// Reasons a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Known command with bad arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Not a known command.
    #[error("unknown command /{0}, try /read, /typing, /reconnect or /quit")]
    Unknown(String),
}

/// Parse one line of input. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(cmd) = line.strip_prefix('/') else {
        return Ok(Some(Command::Submit(line.to_string())));
    };

    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let name = parts.first().copied().unwrap_or("");

    let command = match (name, parts.get(1).copied()) {
        ("read", Some(id)) => {
            let id = id.parse().map_err(|_| CommandError::Usage("/read <message id>"))?;
            Command::Read(id)
        },
        ("read", None) => return Err(CommandError::Usage("/read <message id>")),
        ("typing", Some("on")) => Command::Typing(true),
        ("typing", Some("off")) => Command::Typing(false),
        ("typing", _) => return Err(CommandError::Usage("/typing on|off")),
        ("reconnect", _) => Command::Reconnect,
        ("quit" | "q", _) => Command::Quit,
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse("  is it still for sale? "), Ok(Some(Command::Submit(
            "is it still for sale?".to_string()
        ))));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn read_takes_a_message_id() {
        assert_eq!(parse("/read 42"), Ok(Some(Command::Read(42))));
        assert_eq!(parse("/read"), Err(CommandError::Usage("/read <message id>")));
        assert_eq!(parse("/read abc"), Err(CommandError::Usage("/read <message id>")));
    }

    #[test]
    fn typing_takes_on_or_off() {
        assert_eq!(parse("/typing on"), Ok(Some(Command::Typing(true))));
        assert_eq!(parse("/typing off"), Ok(Some(Command::Typing(false))));
        assert_eq!(parse("/typing maybe"), Err(CommandError::Usage("/typing on|off")));
    }

    #[test]
    fn lifecycle_commands() {
        assert_eq!(parse("/reconnect"), Ok(Some(Command::Reconnect)));
        assert_eq!(parse("/quit"), Ok(Some(Command::Quit)));
        assert_eq!(parse("/q"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse("/shout hi"), Err(CommandError::Unknown("shout".to_string())));
        assert_eq!(parse("/"), Err(CommandError::Unknown(String::new())));
    }
}
