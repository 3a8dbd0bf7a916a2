//! Socket address for a conversation.
//!
//! The socket lives on the same origin as the page that hosts the chat. The
//! scheme mirrors the page: an `https` page gets `wss`, an `http` page gets
//! `ws`.

use chatwire_proto::ConversationId;
use url::Url;

use crate::error::ConnectionError;

/// Default path prefix; the conversation id and a trailing slash follow it.
pub const DEFAULT_PATH_PREFIX: &str = "/ws/chat/";

/// Where to open the conversation socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    secure: bool,
    host: String,
    conversation_id: ConversationId,
    path_prefix: String,
}

impl Endpoint {
    /// Endpoint with an explicit scheme and host (`host` may carry `:port`).
    pub fn new(secure: bool, host: impl Into<String>, conversation_id: ConversationId) -> Self {
        Self {
            secure,
            host: host.into(),
            conversation_id,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
        }
    }

    /// Derive the endpoint from the URL of the hosting page.
    ///
    /// # Errors
    ///
    /// `ConnectionError::InvalidEndpoint` if the URL does not parse, has no
    /// host, or is neither `http` nor `https`.
    pub fn from_page_url(
        page_url: &str,
        conversation_id: ConversationId,
    ) -> Result<Self, ConnectionError> {
        let url = Url::parse(page_url)
            .map_err(|e| ConnectionError::InvalidEndpoint(format!("{page_url}: {e}")))?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(ConnectionError::InvalidEndpoint(format!(
                    "unsupported page scheme {other:?}"
                )));
            },
        };

        let Some(host) = url.host_str() else {
            return Err(ConnectionError::InvalidEndpoint(format!("{page_url}: no host")));
        };

        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self::new(secure, host, conversation_id))
    }

    /// Replace the path prefix. Leading and trailing slashes are normalized.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        self.path_prefix =
            if trimmed.is_empty() { "/".to_string() } else { format!("/{trimmed}/") };
        self
    }

    /// Whether the socket uses TLS.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Host, with port when one was given.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Conversation this endpoint serves.
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Full socket URL, e.g. `wss://market.example/ws/chat/42/`.
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{}{}/", self.host, self.path_prefix, self.conversation_id)
    }
}
