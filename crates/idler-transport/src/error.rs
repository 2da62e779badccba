use std::net::SocketAddr;

use crate::SocketHandle;

/// Errors that can occur in the transport layer.
///
/// Every variant is fatal to the session that hit it: the protocol core
/// never retries a socket operation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not open a socket to the remote endpoint.
    #[error("unable to create socket to {remote}: {reason}")]
    CreateFailed {
        /// The endpoint we tried to reach.
        remote: SocketAddr,
        /// Transport-specific detail.
        reason: String,
    },

    /// The handle does not name a live socket (never created, or destroyed).
    #[error("unknown socket {0}")]
    UnknownSocket(SocketHandle),

    /// Sending data failed.
    #[error("send on {socket} failed: {reason}")]
    SendFailed {
        /// Socket the send was attempted on.
        socket: SocketHandle,
        /// Transport-specific detail.
        reason: String,
    },

    /// Data was reported available but could not be retrieved.
    #[error("receive on {socket} failed: {reason}")]
    ReceiveFailed {
        /// Socket the retrieve was attempted on.
        socket: SocketHandle,
        /// Transport-specific detail.
        reason: String,
    },
}
