//! WebSocket transport for the chat client.
//!
//! Runs a [`ChatTransport`] over a real socket on a tokio task. This is a thin
//! layer that opens sockets, moves text frames and drives the timers; protocol
//! logic remains in the Sans-IO [`ChatTransport`].
//!
//! The driver reports every socket failure as a `SocketError` followed by a
//! `SocketClosed`, so the state machine sees exactly one close per socket.
//! A pending handshake is polled alongside commands, so `disconnect` and
//! `shutdown` abandon it at once.

use std::{collections::VecDeque, future::Future, pin::Pin, time::Duration};

use chatwire_core::{ConnectionError, Endpoint, env::Environment};
use chatwire_proto::{MessageId, OutboundFrame};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

use crate::{
    client::ChatTransport,
    config::{LocalUser, TransportConfig},
    event::{ChatEvent, ClientAction, ClientEvent},
    system_env::SystemEnv,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// In-flight WebSocket handshake, bounded by the connect timeout.
type Handshake = Pin<Box<dyn Future<Output = Result<Socket, String>> + Send>>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The driver task has stopped.
    #[error("transport task has stopped")]
    Closed,

    /// The state machine refused the command.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Commands from the handle to the driver task.
#[derive(Debug)]
enum Command {
    SendMessage(String),
    SubmitInput(String),
    InputChanged,
    Typing(bool),
    ReadReceipt(MessageId),
    Send(OutboundFrame),
    Disconnect,
    Reconnect(oneshot::Sender<Result<(), ConnectionError>>),
    Shutdown,
}

/// Handle to a running chat transport.
///
/// Commands are forwarded to the driver task; UI notifications come back
/// through [`ChatHandle::next_event`]. Dropping the handle stops the task.
pub struct ChatHandle {
    commands: mpsc::Sender<Command>,
    events: mpsc::Receiver<ChatEvent>,
    /// Abort handle to stop the driver task.
    abort_handle: tokio::task::AbortHandle,
}

impl ChatHandle {
    /// Send a chat message. Dropped with a [`ChatEvent::SendDropped`] unless
    /// the socket is open.
    pub async fn send_message(&self, content: impl Into<String>) -> Result<(), TransportError> {
        self.command(Command::SendMessage(content.into())).await
    }

    /// Submit the input field: send the message and end typing.
    pub async fn submit_input(&self, content: impl Into<String>) -> Result<(), TransportError> {
        self.command(Command::SubmitInput(content.into())).await
    }

    /// The input field changed.
    pub async fn input_changed(&self) -> Result<(), TransportError> {
        self.command(Command::InputChanged).await
    }

    /// Send an explicit typing indicator.
    pub async fn send_typing_indicator(&self, is_typing: bool) -> Result<(), TransportError> {
        self.command(Command::Typing(is_typing)).await
    }

    /// Mark a message as read.
    pub async fn send_read_receipt(&self, message_id: MessageId) -> Result<(), TransportError> {
        self.command(Command::ReadReceipt(message_id)).await
    }

    /// Send an arbitrary frame.
    pub async fn send(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.command(Command::Send(frame)).await
    }

    /// Close the socket and suppress automatic reconnects.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        self.command(Command::Disconnect).await
    }

    /// Reset the retry budget and connect now.
    ///
    /// # Errors
    ///
    /// - `TransportError::Connection` while a socket is still outstanding
    /// - `TransportError::Closed` if the driver task has stopped
    pub async fn reconnect(&self) -> Result<(), TransportError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Reconnect(reply)).await?;
        response.await.map_err(|_| TransportError::Closed)??;
        Ok(())
    }

    /// Disconnect, close the socket and wait for the driver task to finish.
    ///
    /// Events still queued are discarded.
    pub async fn shutdown(mut self) -> Result<(), TransportError> {
        self.command(Command::Shutdown).await?;
        while self.events.recv().await.is_some() {}
        Ok(())
    }

    /// Next notification for the UI. `None` once the driver has stopped.
    pub async fn next_event(&mut self) -> Option<ChatEvent> {
        self.events.recv().await
    }

    /// Stop the driver task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }

    async fn command(&self, command: Command) -> Result<(), TransportError> {
        self.commands.send(command).await.map_err(|_| TransportError::Closed)
    }
}

impl Drop for ChatHandle {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Start a chat transport for `endpoint` on the current tokio runtime.
pub fn spawn(config: TransportConfig, user: LocalUser, endpoint: Endpoint) -> ChatHandle {
    spawn_with_env(SystemEnv::new(), config, user, endpoint)
}

/// Start a chat transport with an explicit time source.
pub fn spawn_with_env<E: Environment>(
    env: E,
    config: TransportConfig,
    user: LocalUser,
    endpoint: Endpoint,
) -> ChatHandle {
    // Fails only if another provider was installed first, which is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    let capacity = config.channel_capacity.max(1);
    let connect_timeout = config.connect_timeout;
    let (commands_tx, commands_rx) = mpsc::channel(capacity);
    let (events_tx, events_rx) = mpsc::channel(capacity);

    let (transport, initial) = ChatTransport::open(config, user, endpoint);
    let driver = Driver {
        env,
        transport,
        socket: None,
        handshake: None,
        connect_timeout,
        events: events_tx,
        stopping: false,
    };
    let handle = tokio::spawn(driver.run(commands_rx, initial));

    ChatHandle { commands: commands_tx, events: events_rx, abort_handle: handle.abort_handle() }
}

/// Owns the socket and feeds the state machine.
struct Driver<E: Environment> {
    env: E,
    transport: ChatTransport<E::Instant>,
    socket: Option<Socket>,
    handshake: Option<Handshake>,
    connect_timeout: Duration,
    events: mpsc::Sender<ChatEvent>,
    /// Set once the handle asked to stop.
    stopping: bool,
}

impl<E: Environment> Driver<E> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, initial: Vec<ClientAction>) {
        self.execute(initial).await;

        while !self.stopping {
            let wakeup = self.transport.poll_timeout(self.env.now());

            let actions = tokio::select! {
                command = commands.recv() => self.apply(command.unwrap_or(Command::Shutdown)),
                result = handshake_done(&mut self.handshake) => self.on_handshake(result),
                message = next_message(&mut self.socket) => self.on_message(message),
                () = wait(&self.env, wakeup) => {
                    let now = self.env.now();
                    self.transport.handle(ClientEvent::Tick, now)
                },
            };

            self.execute(actions).await;
        }

        tracing::debug!("chat transport stopped");
        if let Some(mut socket) = self.socket.take()
            && let Err(e) = socket.close(None).await
        {
            tracing::debug!(error = %e, "error closing chat socket");
        }
    }

    fn apply(&mut self, command: Command) -> Vec<ClientAction> {
        match command {
            Command::SendMessage(content) => self.transport.send_message(&content),
            Command::SubmitInput(content) => self.transport.submit_input(&content),
            Command::InputChanged => {
                let now = self.env.now();
                self.transport.input_changed(now)
            },
            Command::Typing(is_typing) => self.transport.send_typing_indicator(is_typing),
            Command::ReadReceipt(message_id) => self.transport.send_read_receipt(message_id),
            Command::Send(frame) => self.transport.send(frame),
            Command::Disconnect => self.transport.disconnect(),
            Command::Shutdown => {
                self.stopping = true;
                self.transport.disconnect()
            },
            Command::Reconnect(reply) => {
                let (result, actions) = match self.transport.reconnect() {
                    Ok(actions) => (Ok(()), actions),
                    Err(e) => (Err(e), vec![]),
                };
                // Caller may have given up waiting
                let _ = reply.send(result);
                actions
            },
        }
    }

    fn on_message(
        &mut self,
        message: Option<Result<Message, tungstenite::Error>>,
    ) -> Vec<ClientAction> {
        let now = self.env.now();
        match message {
            Some(Ok(Message::Text(text))) => {
                self.transport.handle(ClientEvent::TextReceived(text), now)
            },
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(?frame, "server closed chat socket");
                self.socket_closed(now)
            },
            Some(Ok(Message::Binary(data))) => {
                tracing::debug!(len = data.len(), "ignoring binary frame");
                vec![]
            },
            Some(Ok(_)) => vec![],
            Some(Err(e)) => self.socket_failed(e.to_string(), now),
            None => self.socket_closed(now),
        }
    }

    /// Execute actions in order. Actions produced while executing are
    /// appended to the queue.
    async fn execute(&mut self, actions: Vec<ClientAction>) {
        let mut queue: VecDeque<ClientAction> = actions.into();

        while let Some(action) = queue.pop_front() {
            match action {
                ClientAction::OpenSocket { url } => {
                    self.socket = None;
                    self.handshake = Some(handshake(url, self.connect_timeout));
                },
                ClientAction::SendText(text) => {
                    let Some(socket) = self.socket.as_mut() else {
                        queue.push_front(dropped(&text));
                        continue;
                    };
                    if let Err(e) = socket.send(Message::Text(text)).await {
                        let now = self.env.now();
                        queue.extend(self.socket_failed(e.to_string(), now));
                    }
                },
                ClientAction::CloseSocket => {
                    if self.handshake.take().is_some() {
                        tracing::debug!("abandoning chat socket handshake");
                    }
                    if let Some(mut socket) = self.socket.take()
                        && let Err(e) = socket.close(None).await
                    {
                        tracing::debug!(error = %e, "error closing chat socket");
                    }
                    let now = self.env.now();
                    queue.extend(self.transport.handle(ClientEvent::SocketClosed, now));
                },
                ClientAction::Notify(event) => {
                    if self.events.send(event).await.is_err() {
                        tracing::debug!("chat event receiver dropped");
                    }
                },
            }
        }
    }

    fn on_handshake(&mut self, result: Result<Socket, String>) -> Vec<ClientAction> {
        self.handshake = None;
        let now = self.env.now();

        match result {
            Ok(socket) => {
                self.socket = Some(socket);
                self.transport.handle(ClientEvent::SocketOpened, now)
            },
            Err(message) => self.socket_failed(message, now),
        }
    }

    fn socket_failed(&mut self, message: String, now: E::Instant) -> Vec<ClientAction> {
        let mut actions = self.transport.handle(ClientEvent::SocketError { message }, now);
        actions.extend(self.socket_closed(now));
        actions
    }

    fn socket_closed(&mut self, now: E::Instant) -> Vec<ClientAction> {
        self.socket = None;
        self.transport.handle(ClientEvent::SocketClosed, now)
    }
}

fn handshake(url: String, limit: Duration) -> Handshake {
    Box::pin(async move {
        match tokio::time::timeout(limit, connect_async(url.as_str())).await {
            Ok(Ok((socket, _response))) => {
                tracing::info!(url = %url, "chat socket open");
                Ok(socket)
            },
            Ok(Err(e)) => Err(format!("connect failed: {e}")),
            Err(_) => Err(format!("handshake timed out after {limit:?}")),
        }
    })
}

/// A frame the state machine released after the socket went away.
fn dropped(text: &str) -> ClientAction {
    let kind = OutboundFrame::decode(text).map_or("frame", |frame| frame.kind());
    tracing::warn!(kind, "chat socket gone, dropping outbound frame");
    ClientAction::Notify(ChatEvent::SendDropped { kind, reason: "not connected".to_string() })
}

async fn handshake_done(handshake: &mut Option<Handshake>) -> Result<Socket, String> {
    match handshake {
        Some(handshake) => handshake.await,
        None => std::future::pending().await,
    }
}

async fn next_message(
    socket: &mut Option<Socket>,
) -> Option<Result<Message, tungstenite::Error>> {
    match socket {
        Some(socket) => socket.next().await,
        None => std::future::pending().await,
    }
}

async fn wait<E: Environment>(env: &E, wakeup: Option<Duration>) {
    match wakeup {
        Some(delay) => env.sleep(delay).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_released_after_socket_loss_is_reported() {
        let text = OutboundFrame::Read { message_id: 4 }.encode().unwrap();
        assert_eq!(
            dropped(&text),
            ClientAction::Notify(ChatEvent::SendDropped {
                kind: "read",
                reason: "not connected".to_string(),
            })
        );
    }

    #[test]
    fn unreadable_text_is_reported_as_a_frame() {
        assert!(matches!(
            dropped("not json"),
            ClientAction::Notify(ChatEvent::SendDropped { kind: "frame", .. })
        ));
    }
}
