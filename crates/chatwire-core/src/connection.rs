//! Connection lifecycle state machine.
//!
//! Owns the connect / reconnect policy for one conversation socket. Uses the
//! action pattern: socket events and time go in as method calls, actions come
//! out for the driver to execute. The machine never touches a socket or a
//! timer; the reconnect timer is a deadline the driver polls through
//! [`Connection::tick`].
//!
//! # State Machine
//!
//! ```text
//!                     open
//! ┌────────────┐ ──────────────────> ┌──────┐
//! │ Connecting │                     │ Open │
//! └────────────┘ <────────────────── └──────┘
//!       │         close, attempts < max  │
//!       │         (reopen on tick)       │ disconnect()
//!       │ close, attempts >= max         ↓
//!       ↓                       ┌─────────────────────┐
//! ┌──────────────────────────┐  │ Closed(Intentional) │
//! │ Closed(RetriesExhausted) │  └─────────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! Socket errors report a status and change nothing; reconnection is driven
//! by the close that follows.
//!
//! # Invariants
//!
//! - At most one socket is outstanding. Every [`ConnectionAction::Open`]
//!   replaces the previous socket.
//! - At most one reconnect is pending. A close only counts while a socket is
//!   outstanding, so one socket arms at most one timer.
//! - `attempts <= policy.max_attempts`.
//! - `Closed` is left only through [`Connection::reconnect`].

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use crate::{backoff::ReconnectPolicy, error::ConnectionError};

/// Connection status reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Socket is open.
    Connected,
    /// Socket closed; a reconnect may or may not follow.
    Disconnected,
    /// Socket reported an error. A close usually follows.
    Error,
}

impl ConnectionStatus {
    /// Lowercase name, as used by the hosting page's status bar.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

/// Why a connection reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Automatic reconnects used up the policy's budget.
    RetriesExhausted,
    /// The consumer called [`Connection::disconnect`].
    Intentional,
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket opening, or waiting for the backoff timer before reopening.
    Connecting,
    /// Socket open; frames may be sent.
    Open,
    /// Terminal. No automatic reconnects.
    Closed(CloseReason),
}

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Discard any existing socket and open a new one to `url`.
    Open {
        /// Socket URL.
        url: String,
    },
    /// Close the current socket.
    Close,
    /// Report a status change to the UI.
    Status(ConnectionStatus),
    /// A reconnect timer was armed.
    ReconnectScheduled {
        /// 1-indexed retry number.
        attempt: u32,
        /// Time until the retry.
        delay: Duration,
    },
    /// The retry budget is spent; the connection is now closed.
    GaveUp {
        /// Retries made before giving up.
        attempts: u32,
    },
}

/// Armed reconnect timer.
#[derive(Debug, Clone, Copy)]
struct PendingReconnect<I> {
    since: I,
    delay: Duration,
}

/// Connection lifecycle state machine.
///
/// Generic over `Instant` so tests can drive it with synthetic time.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Current state
    state: ConnectionState,
    /// Backoff schedule and retry budget
    policy: ReconnectPolicy,
    /// Socket URL
    url: String,
    /// Retries since the last successful open
    attempts: u32,
    /// A socket has been requested and has not closed yet
    socket_outstanding: bool,
    /// Armed reconnect timer, if any
    pending: Option<PendingReconnect<I>>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a connection in [`ConnectionState::Connecting`] with no socket.
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Connecting,
            policy,
            url: url.into(),
            attempts: 0,
            socket_outstanding: false,
            pending: None,
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether frames may be sent right now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Retries since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Socket URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Backoff policy in use.
    #[must_use]
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Whether a reconnect timer is armed.
    #[must_use]
    pub fn has_pending_reconnect(&self) -> bool {
        self.pending.is_some()
    }

    /// Open a socket.
    ///
    /// Any socket from an earlier attempt is discarded by the driver when it
    /// executes the returned `Open`. A pending reconnect timer is cancelled.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` once closed; use
    ///   [`Connection::reconnect`]
    pub fn connect(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if let ConnectionState::Closed(_) = self.state {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "connect".to_string(),
            });
        }

        Ok(self.open_socket())
    }

    /// Socket finished its handshake.
    pub fn handle_open(&mut self) -> Vec<ConnectionAction> {
        if let ConnectionState::Closed(_) = self.state {
            // disconnect() raced the handshake
            return vec![ConnectionAction::Close];
        }

        self.state = ConnectionState::Open;
        self.attempts = 0;
        vec![ConnectionAction::Status(ConnectionStatus::Connected)]
    }

    /// Socket closed, for any reason.
    ///
    /// Schedules a reconnect while the budget lasts; gives up otherwise.
    pub fn handle_close(&mut self, now: I) -> Vec<ConnectionAction> {
        if !self.socket_outstanding {
            return vec![];
        }
        self.socket_outstanding = false;

        if let ConnectionState::Closed(_) = self.state {
            return vec![];
        }

        let mut actions = vec![ConnectionAction::Status(ConnectionStatus::Disconnected)];

        if self.policy.allows(self.attempts) {
            self.attempts += 1;
            let delay = self.policy.delay_for(self.attempts);
            self.pending = Some(PendingReconnect { since: now, delay });
            self.state = ConnectionState::Connecting;
            actions.push(ConnectionAction::ReconnectScheduled { attempt: self.attempts, delay });
        } else {
            self.state = ConnectionState::Closed(CloseReason::RetriesExhausted);
            actions.push(ConnectionAction::GaveUp { attempts: self.attempts });
        }

        debug_assert!(self.attempts <= self.policy.max_attempts);
        actions
    }

    /// Socket reported an error. No transition; the close that follows
    /// drives reconnection.
    pub fn handle_error(&mut self) -> Vec<ConnectionAction> {
        vec![ConnectionAction::Status(ConnectionStatus::Error)]
    }

    /// Close deliberately and suppress all automatic reconnects.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        if let ConnectionState::Closed(_) = self.state {
            self.pending = None;
            return vec![];
        }

        let was_open = self.state == ConnectionState::Open;
        self.state = ConnectionState::Closed(CloseReason::Intentional);
        self.pending = None;

        let mut actions = Vec::new();
        if self.socket_outstanding {
            actions.push(ConnectionAction::Close);
        }
        if was_open {
            actions.push(ConnectionAction::Status(ConnectionStatus::Disconnected));
        }
        actions
    }

    /// Explicit recovery: reset the retry budget and connect now.
    ///
    /// Allowed when closed or while waiting on the backoff timer.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` while a socket is outstanding
    pub fn reconnect(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.socket_outstanding {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "reconnect".to_string(),
            });
        }

        self.attempts = 0;
        Ok(self.open_socket())
    }

    /// Fire the reconnect timer if its delay has elapsed.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        match self.pending {
            Some(pending) if now - pending.since >= pending.delay => self.open_socket(),
            _ => vec![],
        }
    }

    /// Time left until the reconnect timer fires. `None` if none is armed.
    #[must_use]
    pub fn time_until_reconnect(&self, now: I) -> Option<Duration> {
        self.pending.map(|p| p.delay.saturating_sub(now - p.since))
    }

    fn open_socket(&mut self) -> Vec<ConnectionAction> {
        self.state = ConnectionState::Connecting;
        self.pending = None;
        self.socket_outstanding = true;
        vec![ConnectionAction::Open { url: self.url.clone() }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "ws://localhost/ws/chat/1/";

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn connection() -> Connection<Duration> {
        Connection::new(URL, ReconnectPolicy::default())
    }

    /// Connection that has opened once.
    fn open_connection() -> Connection<Duration> {
        let mut conn = connection();
        conn.connect().unwrap();
        conn.handle_open();
        conn
    }

    #[test]
    fn connection_lifecycle() {
        let mut conn = connection();
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let actions = conn.connect().unwrap();
        assert_eq!(actions, vec![ConnectionAction::Open { url: URL.to_string() }]);

        let actions = conn.handle_open();
        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(actions, vec![ConnectionAction::Status(ConnectionStatus::Connected)]);

        let actions = conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Closed(CloseReason::Intentional));
        assert_eq!(actions, vec![
            ConnectionAction::Close,
            ConnectionAction::Status(ConnectionStatus::Disconnected)
        ]);
    }

    #[test]
    fn close_schedules_reconnect_with_backoff() {
        let mut conn = open_connection();

        let actions = conn.handle_close(ms(0));
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert_eq!(actions, vec![
            ConnectionAction::Status(ConnectionStatus::Disconnected),
            ConnectionAction::ReconnectScheduled { attempt: 1, delay: ms(2000) },
        ]);

        assert!(conn.tick(ms(1999)).is_empty());
        assert_eq!(conn.time_until_reconnect(ms(1500)), Some(ms(500)));

        let actions = conn.tick(ms(2000));
        assert_eq!(actions, vec![ConnectionAction::Open { url: URL.to_string() }]);
        assert!(!conn.has_pending_reconnect());
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut conn = open_connection();
        let mut now = ms(0);
        let mut delays = Vec::new();

        for _ in 0..5 {
            let actions = conn.handle_close(now);
            let Some(ConnectionAction::ReconnectScheduled { delay, .. }) = actions.last() else {
                panic!("expected a scheduled reconnect, got {actions:?}");
            };
            delays.push(delay.as_millis() as u64);
            now += *delay;
            assert_eq!(conn.tick(now).len(), 1);
        }
        assert_eq!(delays, vec![2000, 4000, 8000, 16000, 30000]);

        let actions = conn.handle_close(now);
        assert_eq!(conn.state(), ConnectionState::Closed(CloseReason::RetriesExhausted));
        assert_eq!(actions, vec![
            ConnectionAction::Status(ConnectionStatus::Disconnected),
            ConnectionAction::GaveUp { attempts: 5 },
        ]);

        // Nothing is scheduled, however long we wait
        assert!(conn.tick(now + ms(3_600_000)).is_empty());
        assert!(matches!(conn.connect(), Err(ConnectionError::InvalidState { .. })));
    }

    #[test]
    fn successful_open_resets_attempts() {
        let mut conn = open_connection();
        conn.handle_close(ms(0));
        conn.tick(ms(2000));
        conn.handle_close(ms(2100));
        assert_eq!(conn.attempts(), 2);

        conn.tick(ms(10_000));
        conn.handle_open();
        assert_eq!(conn.attempts(), 0);

        let actions = conn.handle_close(ms(20_000));
        assert!(actions.contains(&ConnectionAction::ReconnectScheduled { attempt: 1, delay: ms(2000) }));
    }

    #[test]
    fn error_reports_status_without_transition() {
        let mut conn = open_connection();
        let actions = conn.handle_error();
        assert_eq!(actions, vec![ConnectionAction::Status(ConnectionStatus::Error)]);
        assert_eq!(conn.state(), ConnectionState::Open);
        assert!(!conn.has_pending_reconnect());
    }

    #[test]
    fn disconnect_then_close_schedules_nothing() {
        let mut conn = open_connection();
        conn.disconnect();

        let actions = conn.handle_close(ms(0));
        assert!(actions.is_empty());
        assert!(!conn.has_pending_reconnect());
        assert!(conn.tick(ms(60_000)).is_empty());
    }

    #[test]
    fn disconnect_while_waiting_cancels_timer() {
        let mut conn = open_connection();
        conn.handle_close(ms(0));
        assert!(conn.has_pending_reconnect());

        let actions = conn.disconnect();
        assert!(actions.is_empty());
        assert_eq!(conn.state(), ConnectionState::Closed(CloseReason::Intentional));
        assert!(conn.tick(ms(60_000)).is_empty());
    }

    #[test]
    fn close_without_socket_is_ignored() {
        let mut conn = open_connection();
        conn.handle_close(ms(0));

        // Second close for the same socket must not arm another timer
        assert!(conn.handle_close(ms(10)).is_empty());
        assert_eq!(conn.attempts(), 1);
    }

    #[test]
    fn open_after_disconnect_closes_socket() {
        let mut conn = connection();
        conn.connect().unwrap();
        let actions = conn.disconnect();
        assert_eq!(actions, vec![ConnectionAction::Close]);

        assert_eq!(conn.handle_open(), vec![ConnectionAction::Close]);
        assert_eq!(conn.state(), ConnectionState::Closed(CloseReason::Intentional));
    }

    #[test]
    fn reconnect_recovers_from_exhaustion() {
        let mut conn =
            Connection::new(URL, ReconnectPolicy { max_attempts: 0, ..Default::default() });
        conn.connect().unwrap();
        conn.handle_close(ms(0));
        assert_eq!(conn.state(), ConnectionState::Closed(CloseReason::RetriesExhausted));

        let actions = conn.reconnect().unwrap();
        assert_eq!(actions, vec![ConnectionAction::Open { url: URL.to_string() }]);
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert_eq!(conn.attempts(), 0);
    }

    #[test]
    fn reconnect_rejected_while_socket_outstanding() {
        let mut conn = open_connection();
        assert!(matches!(conn.reconnect(), Err(ConnectionError::InvalidState { .. })));
    }

    #[test]
    fn reconnect_skips_backoff_wait() {
        let mut conn = open_connection();
        conn.handle_close(ms(0));

        let actions = conn.reconnect().unwrap();
        assert_eq!(actions.len(), 1);
        assert!(!conn.has_pending_reconnect());
    }
}
