//! The session: the client's one connection to the application server.
//!
//! A [`Session`] owns the socket and the identity handles it acquired at
//! start-up and is the only place the [`ConnectionState`] changes. Event
//! handlers (see [`crate::dispatch`]) compute the next state and hand it to
//! [`Session::transition_to`], which refuses to leave a terminal state. The
//! "keep running" flag is derived from the state rather than stored.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use idler_identity::{IdentityProvider, ItemDetails, ItemId, PipeHandle, UserHandle};
use idler_protocol::{OutboundMessage, WireMessage};
use idler_transport::{SocketHandle, Transport, TransportError};
use serde::Deserialize;

use crate::{ConnectError, ConnectionState, FailureCause};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timeouts for a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest allowed gap between server pings before the session is
    /// declared dead. Default: 30 seconds.
    pub liveness_timeout_secs: u64,

    /// Connect timeout handed to the transport when the socket is created.
    /// Default: 20 seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            liveness_timeout_secs: 30,
            connect_timeout_secs: 20,
        }
    }
}

impl SessionConfig {
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Pass-through data
// ---------------------------------------------------------------------------

/// Server details received during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo {
    pub server_id: u64,
    pub vac_secure: bool,
}

/// Data the session surfaces to its caller without acting on it.
///
/// Drained with [`Session::take_notices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Server details arrived.
    ServerInfo(ServerInfo),
    /// Authentication completed with this message of the day.
    Motd(String),
    /// A ping arrived; the server reported this many items in total.
    Ping { items_total: u32 },
    /// The server named an item we were granted.
    ItemName(String),
    /// The identity provider finished loading the inventory.
    ItemCount(u32),
    /// An item was granted and reported to the server.
    ItemGranted { item_id: ItemId, details: ItemDetails },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One client-to-server connection and its protocol state.
///
/// The transport and the identity provider are borrowed, not owned: they
/// outlive the session and may be shared with other code.
pub struct Session<'a, T: Transport, I: IdentityProvider> {
    pub(crate) transport: &'a T,
    pub(crate) identity: &'a I,
    pub(crate) config: SessionConfig,
    pub(crate) remote: SocketAddr,
    pub(crate) socket: Option<SocketHandle>,
    pub(crate) pipe: Option<PipeHandle>,
    pub(crate) user: Option<UserHandle>,
    pub(crate) state: ConnectionState,
    pub(crate) last_liveness: Instant,
    pub(crate) server: Option<ServerInfo>,
    pub(crate) motd: Option<String>,
    pub(crate) notices: Vec<SessionNotice>,
    pub(crate) transitions: u32,
}

impl<'a, T: Transport, I: IdentityProvider> Session<'a, T, I> {
    /// Opens an identity session and a socket to `remote`.
    ///
    /// On success the session is `Connecting` and the liveness clock starts
    /// now. Handles acquired before a failure are released again.
    ///
    /// # Errors
    /// - [`ConnectError::IdentityUnavailable`]: no pipe or user
    /// - [`ConnectError::TransportUnavailable`]: no socket
    pub fn start(
        transport: &'a T,
        identity: &'a I,
        remote: SocketAddr,
        config: SessionConfig,
    ) -> Result<Self, ConnectError> {
        tracing::info!(%remote, "initializing client session");

        let pipe = identity
            .create_pipe()
            .map_err(ConnectError::IdentityUnavailable)?;

        let user = match identity.connect_user(pipe) {
            Ok(user) => user,
            Err(e) => {
                identity.release_pipe(pipe);
                return Err(ConnectError::IdentityUnavailable(e));
            }
        };

        tracing::debug!(pipe = pipe.0, user = user.0, "identity session ready");

        let socket = match transport.create_socket(remote, config.connect_timeout()) {
            Ok(socket) => socket,
            Err(e) => {
                identity.release_user(pipe, user);
                identity.release_pipe(pipe);
                return Err(ConnectError::TransportUnavailable(e));
            }
        };

        tracing::info!(%socket, %remote, "connecting to server");

        Ok(Self {
            transport,
            identity,
            config,
            remote,
            socket: Some(socket),
            pipe: Some(pipe),
            user: Some(user),
            state: ConnectionState::Connecting,
            last_liveness: Instant::now(),
            server: None,
            motd: None,
            notices: Vec::new(),
            transitions: 0,
        })
    }

    /// Whether the session should keep being driven.
    pub fn is_running(&self) -> bool {
        self.state.is_live()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// When the liveness clock was last reset (start-up or last ping).
    pub fn last_liveness(&self) -> Instant {
        self.last_liveness
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// The session's socket, `None` after [`end`](Self::end).
    pub fn socket(&self) -> Option<SocketHandle> {
        self.socket
    }

    pub fn transport(&self) -> &'a T {
        self.transport
    }

    pub fn identity(&self) -> &'a I {
        self.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn server_info(&self) -> Option<ServerInfo> {
        self.server
    }

    pub fn motd(&self) -> Option<&str> {
        self.motd.as_deref()
    }

    /// Number of state changes applied since start-up.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Removes and returns every notice surfaced so far.
    pub fn take_notices(&mut self) -> Vec<SessionNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Declares the session dead if no ping arrived within the liveness
    /// timeout.
    pub fn check_liveness(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }
        let silent_for = now.saturating_duration_since(self.last_liveness);
        if silent_for > self.config.liveness_timeout() {
            tracing::warn!(
                silent_secs = silent_for.as_secs(),
                timeout_secs = self.config.liveness_timeout_secs,
                "lost connection to server (no ping)"
            );
            self.transition_to(ConnectionState::TimedOut);
        }
    }

    /// Reports that a frame reported as waiting could not be retrieved.
    pub fn on_receive_failure(&mut self, error: &TransportError) {
        tracing::warn!(%error, "unable to read from server");
        self.transition_to(ConnectionState::TransportFailed(FailureCause::ReceiveFailed));
    }

    /// Releases the socket and the identity handles.
    ///
    /// Idempotent: a second call finds nothing left to release. A session
    /// torn down while still live ends up `Idle`; a terminal state is kept
    /// so the caller can still read why the session ended.
    pub fn end(&mut self) {
        if let Some(socket) = self.socket.take() {
            if let Err(e) = self.transport.destroy_socket(socket) {
                tracing::warn!(%socket, error = %e, "socket teardown failed");
            }
        }
        if let (Some(pipe), Some(user)) = (self.pipe, self.user.take()) {
            self.identity.release_user(pipe, user);
        }
        if let Some(pipe) = self.pipe.take() {
            self.identity.release_pipe(pipe);
        }
        if self.state.is_live() {
            tracing::info!(from = self.state.name(), "session torn down while live");
            self.state = ConnectionState::Idle;
        }
    }

    /// Applies the next state. Leaving a terminal (or torn-down) state is
    /// refused, and a same-state "transition" is not counted.
    pub(crate) fn transition_to(&mut self, next: ConnectionState) {
        if !self.state.is_live() {
            tracing::debug!(
                current = %self.state,
                ignored = %next,
                "session not running, transition ignored"
            );
            return;
        }
        if next == self.state {
            return;
        }

        if next.is_terminal() {
            tracing::warn!(from = self.state.name(), to = %next, "session ended");
        } else {
            tracing::info!(from = self.state.name(), to = next.name(), "state transition");
        }
        self.state = next;
        self.transitions += 1;
    }

    /// Encodes and sends one message.
    pub(crate) fn send(&self, msg: &OutboundMessage) -> Result<(), FailureCause> {
        let opcode = msg.opcode();
        let bytes = msg.encode().map_err(|e| {
            tracing::warn!(?opcode, error = %e, "unable to encode message");
            FailureCause::Unencodable(opcode)
        })?;
        let socket = self.socket.ok_or(FailureCause::SendFailed(opcode))?;
        self.transport.send(socket, &bytes).map_err(|e| {
            tracing::warn!(?opcode, error = %e, "unable to send message to server");
            FailureCause::SendFailed(opcode)
        })
    }

    /// Sends `msg` and returns `on_success`, or the failure state.
    pub(crate) fn send_then(
        &self,
        msg: &OutboundMessage,
        on_success: ConnectionState,
    ) -> ConnectionState {
        match self.send(msg) {
            Ok(()) => on_success,
            Err(cause) => ConnectionState::TransportFailed(cause),
        }
    }
}

impl<T: Transport, I: IdentityProvider> Drop for Session<'_, T, I> {
    fn drop(&mut self) {
        self.end();
    }
}
