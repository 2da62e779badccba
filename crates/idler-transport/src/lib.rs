//! Reliable socket adapter for idler.
//!
//! The protocol core does not own any networking. It talks to an externally
//! supplied reliable point-to-point socket layer through the [`Transport`]
//! trait: create a socket, poll it for a waiting frame, pull the frame out,
//! send bytes, destroy the socket.
//!
//! Every method is synchronous and non-blocking. "No data yet" is a normal
//! answer (`None` from [`Transport::available`]), never an error, so the
//! core can poll once per tick without ever suspending.
//!
//! # Feature Flags
//!
//! - `memory` (default): [`MemoryTransport`], an in-process transport used
//!   by tests and the loopback demo

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::TransportError;
#[cfg(feature = "memory")]
pub use memory::MemoryTransport;

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Opaque handle to a socket created by a [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle(u32);

impl SocketHandle {
    /// Creates a new `SocketHandle` from a raw `u32`.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the underlying `u32` value.
    pub fn into_inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sock-{}", self.0)
    }
}

/// A reliable, message-oriented socket layer.
///
/// Implementations must reject operations on a destroyed or unknown handle
/// with [`TransportError::UnknownSocket`] rather than misbehave.
pub trait Transport {
    /// Opens a connection socket to `remote`.
    ///
    /// Connection progress is reported asynchronously (by the identity
    /// layer's socket-status callbacks), so success here only means the
    /// socket exists.
    fn create_socket(
        &self,
        remote: SocketAddr,
        timeout: Duration,
    ) -> Result<SocketHandle, TransportError>;

    /// Returns the size of the next waiting frame, or `None` if nothing is
    /// buffered (or the handle is unknown).
    fn available(&self, socket: SocketHandle) -> Option<usize>;

    /// Number of whole frames buffered on `socket` right now (0 for an
    /// unknown handle).
    ///
    /// The driver reads at most this many frames per tick, so frames that
    /// arrive while it is reading wait for the next tick.
    fn pending(&self, socket: SocketHandle) -> usize;

    /// Retrieves the next waiting frame. `size` is the value reported by
    /// [`available`](Self::available).
    fn retrieve(
        &self,
        socket: SocketHandle,
        size: usize,
    ) -> Result<Vec<u8>, TransportError>;

    /// Sends one frame reliably.
    fn send(
        &self,
        socket: SocketHandle,
        data: &[u8],
    ) -> Result<(), TransportError>;

    /// Destroys the socket. Later operations on `socket` are rejected.
    fn destroy_socket(&self, socket: SocketHandle) -> Result<(), TransportError>;
}
