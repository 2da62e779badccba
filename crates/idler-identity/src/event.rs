//! Callback events delivered by the identity provider.
//!
//! The provider buffers these asynchronously and the lifecycle driver drains
//! them once per tick. They are a separate type from the wire messages on
//! purpose: the two sources are never merged into one enum.

use std::fmt;

use idler_transport::SocketHandle;

use crate::ItemId;

/// Connection state of a provider-managed socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketState {
    /// No connection (raw 0).
    Invalid,
    /// The connection is up and can carry frames.
    Connected,
    /// A connection attempt has started.
    Initiated,
    /// Local address candidates were gathered.
    LocalCandidatesFound,
    /// The remote end's address candidates arrived.
    ReceivedRemoteCandidates,
    /// The transport-level handshake is running.
    ChallengeHandshake,
    /// Shutdown is in progress.
    Disconnecting,
    /// This side closed the connection.
    LocalDisconnect,
    /// The connection attempt timed out.
    TimeoutDuringConnect,
    /// The remote end closed the connection.
    RemoteEndDisconnected,
    /// The connection dropped unexpectedly.
    ConnectionBroken,
    /// A raw state value this client does not know.
    Unknown(u32),
}

impl SocketState {
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            0 => Self::Invalid,
            1 => Self::Connected,
            10 => Self::Initiated,
            11 => Self::LocalCandidatesFound,
            12 => Self::ReceivedRemoteCandidates,
            15 => Self::ChallengeHandshake,
            21 => Self::Disconnecting,
            22 => Self::LocalDisconnect,
            23 => Self::TimeoutDuringConnect,
            24 => Self::RemoteEndDisconnected,
            25 => Self::ConnectionBroken,
            other => Self::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Connected => "Connected",
            Self::Initiated => "Initiated",
            Self::LocalCandidatesFound => "LocalCandidatesFound",
            Self::ReceivedRemoteCandidates => "ReceivedRemoteCandidates",
            Self::ChallengeHandshake => "ChallengeHandshake",
            Self::Disconnecting => "Disconnecting",
            Self::LocalDisconnect => "LocalDisconnect",
            Self::TimeoutDuringConnect => "TimeoutDuringConnect",
            Self::RemoteEndDisconnected => "RemoteEndDisconnected",
            Self::ConnectionBroken => "ConnectionBroken",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "Unknown({raw})"),
            _ => f.write_str(self.name()),
        }
    }
}

/// One buffered callback from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// A socket changed connection state.
    SocketStatus {
        socket: SocketHandle,
        state: SocketState,
    },

    /// The inventory finished loading.
    ItemCount { count: u32 },

    /// A new item was granted to the user.
    ItemGranted { item_id: ItemId },

    /// An async API call finished. Provider bookkeeping only.
    CallCompleted,

    /// A friend's persona changed. Provider bookkeeping only.
    PersonaStateChange,

    /// Any other callback id.
    Other { kind: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_state_from_u32_known_values() {
        assert_eq!(SocketState::from_u32(1), SocketState::Connected);
        assert_eq!(SocketState::from_u32(23), SocketState::TimeoutDuringConnect);
        assert_eq!(SocketState::from_u32(25), SocketState::ConnectionBroken);
    }

    #[test]
    fn test_socket_state_unknown_keeps_raw_value() {
        let state = SocketState::from_u32(99);
        assert_eq!(state, SocketState::Unknown(99));
        assert_eq!(state.to_string(), "Unknown(99)");
    }

    #[test]
    fn test_socket_state_display_uses_name() {
        assert_eq!(
            SocketState::RemoteEndDisconnected.to_string(),
            "RemoteEndDisconnected"
        );
    }
}
