//! Error types for the session layer.

use idler_identity::IdentityError;
use idler_transport::TransportError;

/// Why a session could not be started.
///
/// Everything that goes wrong after start-up is reported through the
/// session's terminal [`ConnectionState`](crate::ConnectionState) instead.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The transport refused to create a socket.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[source] TransportError),

    /// The identity provider could not open a pipe or attach the user.
    #[error("identity unavailable: {0}")]
    IdentityUnavailable(#[source] IdentityError),
}
