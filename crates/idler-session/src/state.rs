//! Connection lifecycle states.
//!
//! ```text
//!   Idle ──start──→ Connecting ──socket up──→ Handshaking ──ticket sent──→
//!   Authenticating ──authed──→ Authenticated
//!
//!   any live state ──→ Denied | Kicked | TimedOut | TransportFailed
//! ```
//!
//! The four failure states are terminal. Once one is entered the session
//! stops running and no later event can move it anywhere else.

use std::fmt;

use idler_identity::SocketState;
use idler_protocol::{DenyReason, Opcode};

/// What made a session fail at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The socket never finished connecting.
    ConnectTimeout,
    /// The socket dropped after connecting.
    ConnectionLost(SocketState),
    /// The identity provider issued an empty ticket.
    TicketUnavailable,
    /// A message could not be handed to the transport.
    SendFailed(Opcode),
    /// A message could not be encoded into its fixed layout.
    Unencodable(Opcode),
    /// A waiting frame could not be retrieved.
    ReceiveFailed,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout => f.write_str("unable to connect to server"),
            Self::ConnectionLost(state) => {
                write!(f, "lost connection to server ({state})")
            }
            Self::TicketUnavailable => f.write_str("no auth ticket issued"),
            Self::SendFailed(op) => write!(f, "unable to send {op:?}"),
            Self::Unencodable(op) => write!(f, "unable to encode {op:?}"),
            Self::ReceiveFailed => f.write_str("unable to read from server"),
        }
    }
}

/// The state of the client's one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not started, or torn down before reaching a terminal state.
    Idle,
    /// Socket created, waiting for the connect callback.
    Connecting,
    /// `ConnectionInit` sent, waiting for server details.
    Handshaking,
    /// Auth ticket sent, waiting for the server's verdict.
    Authenticating,
    /// Fully connected. Pings and item grants are processed here only.
    Authenticated,
    /// The server refused us.
    Denied(DenyReason),
    /// The server removed us.
    Kicked { message: String },
    /// No ping arrived within the liveness timeout.
    TimedOut,
    /// The transport or the handshake broke down.
    TransportFailed(FailureCause),
}

impl ConnectionState {
    /// `true` for the four failure states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Denied(_)
                | Self::Kicked { .. }
                | Self::TimedOut
                | Self::TransportFailed(_)
        )
    }

    /// `true` while the session should keep being driven.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            Self::Connecting
                | Self::Handshaking
                | Self::Authenticating
                | Self::Authenticated
        )
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Handshaking => "Handshaking",
            Self::Authenticating => "Authenticating",
            Self::Authenticated => "Authenticated",
            Self::Denied(_) => "Denied",
            Self::Kicked { .. } => "Kicked",
            Self::TimedOut => "TimedOut",
            Self::TransportFailed(_) => "TransportFailed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(reason) => write!(f, "Denied: {reason}"),
            Self::Kicked { message } => write!(f, "Kicked: {message}"),
            Self::TransportFailed(cause) => write!(f, "TransportFailed: {cause}"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_and_live_are_disjoint() {
        let all = [
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Handshaking,
            ConnectionState::Authenticating,
            ConnectionState::Authenticated,
            ConnectionState::Denied(DenyReason::ServerFull),
            ConnectionState::Kicked { message: "bye".into() },
            ConnectionState::TimedOut,
            ConnectionState::TransportFailed(FailureCause::ReceiveFailed),
        ];
        for state in &all {
            assert!(
                !(state.is_terminal() && state.is_live()),
                "{state} is both terminal and live"
            );
        }
        assert_eq!(all.iter().filter(|s| s.is_terminal()).count(), 4);
        assert_eq!(all.iter().filter(|s| s.is_live()).count(), 4);
    }

    #[test]
    fn test_idle_is_neither_live_nor_terminal() {
        assert!(!ConnectionState::Idle.is_live());
        assert!(!ConnectionState::Idle.is_terminal());
    }

    #[test]
    fn test_display_includes_reason() {
        let denied = ConnectionState::Denied(DenyReason::ServerFull);
        assert_eq!(denied.to_string(), "Denied: Server is full.");

        let lost = ConnectionState::TransportFailed(FailureCause::ConnectionLost(
            SocketState::ConnectionBroken,
        ));
        assert_eq!(
            lost.to_string(),
            "TransportFailed: lost connection to server (ConnectionBroken)"
        );
    }
}
