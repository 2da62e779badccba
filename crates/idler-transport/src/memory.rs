//! In-process [`Transport`] backed by frame queues.
//!
//! `MemoryTransport` plays the role of the remote end: tests (or a scripted
//! demo server) push frames into a socket's inbound queue and read back what
//! the client sent. Failure switches let callers exercise every transport
//! error path without a network.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{SocketHandle, Transport, TransportError};

#[derive(Debug)]
struct MemorySocket {
    remote: SocketAddr,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u32,
    sockets: HashMap<SocketHandle, MemorySocket>,
    destroyed: Vec<SocketHandle>,
    refuse_connections: bool,
    fail_sends: bool,
    fail_receives: bool,
}

/// A [`Transport`] whose sockets are in-memory frame queues.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inner: Mutex<Inner>,
}

impl MemoryTransport {
    /// Creates an empty transport that accepts every socket request.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later [`Transport::create_socket`] call fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Makes every later [`Transport::send`] call fail.
    pub fn fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Makes every later [`Transport::retrieve`] call fail.
    pub fn fail_receives(&self, fail: bool) {
        self.lock().fail_receives = fail;
    }

    /// Queues a frame for the client to pick up from `socket`.
    ///
    /// Returns `false` if the socket does not exist.
    pub fn push_inbound(&self, socket: SocketHandle, frame: Vec<u8>) -> bool {
        match self.lock().sockets.get_mut(&socket) {
            Some(s) => {
                s.inbound.push_back(frame);
                true
            }
            None => false,
        }
    }

    /// Removes and returns every frame the client has sent on `socket`.
    pub fn take_sent(&self, socket: SocketHandle) -> Vec<Vec<u8>> {
        self.lock()
            .sockets
            .get_mut(&socket)
            .map(|s| std::mem::take(&mut s.sent))
            .unwrap_or_default()
    }

    /// Number of frames sent on `socket` that have not been taken yet.
    pub fn sent_count(&self, socket: SocketHandle) -> usize {
        self.lock().sockets.get(&socket).map_or(0, |s| s.sent.len())
    }

    /// Number of frames still waiting to be retrieved on `socket`.
    pub fn pending_inbound(&self, socket: SocketHandle) -> usize {
        self.lock().sockets.get(&socket).map_or(0, |s| s.inbound.len())
    }

    /// The endpoint `socket` was opened against, if it is still live.
    pub fn remote_of(&self, socket: SocketHandle) -> Option<SocketAddr> {
        self.lock().sockets.get(&socket).map(|s| s.remote)
    }

    /// Whether `socket` is live.
    pub fn is_open(&self, socket: SocketHandle) -> bool {
        self.lock().sockets.contains_key(&socket)
    }

    /// Number of live sockets.
    pub fn open_sockets(&self) -> usize {
        self.lock().sockets.len()
    }

    /// Every handle destroyed so far, in order.
    pub fn destroyed(&self) -> Vec<SocketHandle> {
        self.lock().destroyed.clone()
    }
}

impl Transport for MemoryTransport {
    fn create_socket(
        &self,
        remote: SocketAddr,
        timeout: Duration,
    ) -> Result<SocketHandle, TransportError> {
        let mut inner = self.lock();
        if inner.refuse_connections {
            return Err(TransportError::CreateFailed {
                remote,
                reason: "connections refused".into(),
            });
        }

        inner.next_id += 1;
        let handle = SocketHandle::new(inner.next_id);
        inner.sockets.insert(
            handle,
            MemorySocket {
                remote,
                inbound: VecDeque::new(),
                sent: Vec::new(),
            },
        );

        tracing::debug!(
            socket = %handle,
            %remote,
            timeout_secs = timeout.as_secs(),
            "memory socket created"
        );
        Ok(handle)
    }

    fn available(&self, socket: SocketHandle) -> Option<usize> {
        self.lock()
            .sockets
            .get(&socket)
            .and_then(|s| s.inbound.front())
            .map(Vec::len)
    }

    fn pending(&self, socket: SocketHandle) -> usize {
        self.pending_inbound(socket)
    }

    fn retrieve(
        &self,
        socket: SocketHandle,
        size: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.lock();
        let fail = inner.fail_receives;
        let s = inner
            .sockets
            .get_mut(&socket)
            .ok_or(TransportError::UnknownSocket(socket))?;

        if fail {
            return Err(TransportError::ReceiveFailed {
                socket,
                reason: "receives disabled".into(),
            });
        }

        match s.inbound.front() {
            None => Err(TransportError::ReceiveFailed {
                socket,
                reason: "no frame waiting".into(),
            }),
            Some(frame) if frame.len() > size => {
                Err(TransportError::ReceiveFailed {
                    socket,
                    reason: format!(
                        "frame of {} bytes does not fit buffer of {size}",
                        frame.len()
                    ),
                })
            }
            Some(_) => Ok(s.inbound.pop_front().unwrap_or_default()),
        }
    }

    fn send(
        &self,
        socket: SocketHandle,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let mut inner = self.lock();
        let fail = inner.fail_sends;
        let s = inner
            .sockets
            .get_mut(&socket)
            .ok_or(TransportError::UnknownSocket(socket))?;

        if fail {
            return Err(TransportError::SendFailed {
                socket,
                reason: "sends disabled".into(),
            });
        }

        s.sent.push(data.to_vec());
        Ok(())
    }

    fn destroy_socket(&self, socket: SocketHandle) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner
            .sockets
            .remove(&socket)
            .ok_or(TransportError::UnknownSocket(socket))?;
        inner.destroyed.push(socket);
        tracing::debug!(%socket, "memory socket destroyed");
        Ok(())
    }
}
