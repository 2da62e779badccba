//! Integration tests for the per-tick driver.
//!
//! The server side is played by pushing encoded frames into the
//! `MemoryTransport`; identity callbacks are queued on `MemoryIdentity`.

use std::time::Duration;

use idler::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

struct Harness {
    transport: MemoryTransport,
    identity: MemoryIdentity,
}

impl Harness {
    fn new() -> Self {
        Self {
            transport: MemoryTransport::new(),
            identity: MemoryIdentity::new("Alyx"),
        }
    }

    fn start(&self) -> Session<'_, MemoryTransport, MemoryIdentity> {
        Session::start(
            &self.transport,
            &self.identity,
            "198.51.100.4:27015".parse().unwrap(),
            SessionConfig::default(),
        )
        .unwrap()
    }

    fn push(&self, session: &Session<'_, MemoryTransport, MemoryIdentity>, msg: InboundMessage) {
        let frame = msg.encode().unwrap();
        assert!(self.transport.push_inbound(session.socket().unwrap(), frame));
    }

    fn push_raw(&self, session: &Session<'_, MemoryTransport, MemoryIdentity>, frame: Vec<u8>) {
        assert!(self.transport.push_inbound(session.socket().unwrap(), frame));
    }

    fn connected(&self, session: &Session<'_, MemoryTransport, MemoryIdentity>) {
        self.identity.push_event(IdentityEvent::SocketStatus {
            socket: session.socket().unwrap(),
            state: SocketState::Connected,
        });
    }
}

fn server_info() -> InboundMessage {
    InboundMessage::ServerSendInfo {
        server_id: 42,
        vac_secure: false,
    }
}

// =========================================================================
// Frames
// =========================================================================

#[test]
fn test_tick_dispatches_waiting_frames() {
    let h = Harness::new();
    let mut session = h.start();
    h.connected(&session);
    let now = session.last_liveness();
    tick(&mut session, now);

    h.push(&session, server_info());
    h.push(&session, InboundMessage::ClientAuthed { motd: "hi".into() });
    let report = tick(&mut session, now);

    assert_eq!(report.frames_dispatched, 2);
    assert_eq!(report.frames_dropped, 0);
    assert_eq!(session.state(), &ConnectionState::Authenticated);
    assert_eq!(h.transport.pending_inbound(session.socket().unwrap()), 0);
}

#[test]
fn test_tick_drops_malformed_frames_and_continues() {
    let h = Harness::new();
    let mut session = h.start();
    h.connected(&session);
    let now = session.last_liveness();
    tick(&mut session, now);

    h.push_raw(&session, vec![1, 0]);
    h.push_raw(&session, vec![5, 0, 0, 0, 9]);
    h.push(&session, server_info());
    let report = tick(&mut session, now);

    assert_eq!(report.frames_dropped, 2);
    assert_eq!(report.frames_dispatched, 1);
    assert_eq!(session.state(), &ConnectionState::Authenticating);
}

#[test]
fn test_tick_unknown_opcode_frame_is_dispatched_without_transition() {
    let h = Harness::new();
    let mut session = h.start();
    let now = session.last_liveness();

    h.push_raw(&session, 77u32.to_le_bytes().to_vec());
    let report = tick(&mut session, now);

    assert_eq!(report.frames_dispatched, 1);
    assert_eq!(session.state(), &ConnectionState::Connecting);
    assert_eq!(session.transitions(), 0);
}

#[test]
fn test_tick_stops_reading_once_terminal() {
    let h = Harness::new();
    let mut session = h.start();
    let now = session.last_liveness();

    h.push(
        &session,
        InboundMessage::ConnectionDenied {
            reason: DenyReason::ServerFull,
        },
    );
    h.push(&session, server_info());
    let socket = session.socket().unwrap();
    let report = tick(&mut session, now);

    assert_eq!(report.frames_dispatched, 1);
    assert_eq!(session.state(), &ConnectionState::Denied(DenyReason::ServerFull));
    assert_eq!(h.transport.pending_inbound(socket), 1);
}

#[test]
fn test_tick_receive_failure_is_transport_failed() {
    let h = Harness::new();
    let mut session = h.start();
    let now = session.last_liveness();
    h.push(&session, server_info());
    h.transport.fail_receives(true);

    let report = tick(&mut session, now);

    assert_eq!(report.frames_dispatched, 0);
    assert_eq!(
        session.state(),
        &ConnectionState::TransportFailed(FailureCause::ReceiveFailed)
    );
    assert!(!session.is_running());
}

/// A transport whose remote end sends another frame every time one is
/// read, so there is always something waiting.
struct RefillingTransport {
    inner: MemoryTransport,
    frame: Vec<u8>,
}

impl Transport for RefillingTransport {
    fn create_socket(
        &self,
        remote: std::net::SocketAddr,
        timeout: Duration,
    ) -> Result<SocketHandle, TransportError> {
        self.inner.create_socket(remote, timeout)
    }

    fn available(&self, socket: SocketHandle) -> Option<usize> {
        self.inner.available(socket)
    }

    fn pending(&self, socket: SocketHandle) -> usize {
        self.inner.pending(socket)
    }

    fn retrieve(&self, socket: SocketHandle, size: usize) -> Result<Vec<u8>, TransportError> {
        let frame = self.inner.retrieve(socket, size)?;
        self.inner.push_inbound(socket, self.frame.clone());
        Ok(frame)
    }

    fn send(&self, socket: SocketHandle, data: &[u8]) -> Result<(), TransportError> {
        self.inner.send(socket, data)
    }

    fn destroy_socket(&self, socket: SocketHandle) -> Result<(), TransportError> {
        self.inner.destroy_socket(socket)
    }
}

#[test]
fn test_tick_reads_only_frames_buffered_at_start() {
    let transport = RefillingTransport {
        inner: MemoryTransport::new(),
        frame: 77u32.to_le_bytes().to_vec(),
    };
    let identity = MemoryIdentity::new("Alyx");
    let mut session = Session::start(
        &transport,
        &identity,
        "198.51.100.4:27015".parse().unwrap(),
        SessionConfig::default(),
    )
    .unwrap();
    let socket = session.socket().unwrap();
    let t0 = session.last_liveness();
    transport.inner.push_inbound(socket, transport.frame.clone());
    identity.push_event(IdentityEvent::ItemCount { count: 8 });

    let report = tick(&mut session, t0);

    assert_eq!(report.frames_dispatched, 1);
    assert_eq!(report.events_dispatched, 1);
    assert_eq!(transport.inner.pending_inbound(socket), 1);

    // The liveness check still runs with frames streaming in.
    let report = tick(&mut session, t0 + Duration::from_secs(31));
    assert_eq!(report.frames_dispatched, 1);
    assert_eq!(session.state(), &ConnectionState::TimedOut);
}

// =========================================================================
// Identity callbacks
// =========================================================================

#[test]
fn test_tick_dispatches_identity_events() {
    let h = Harness::new();
    let mut session = h.start();
    let now = session.last_liveness();
    h.connected(&session);
    h.identity.push_event(IdentityEvent::ItemCount { count: 3 });
    h.identity.push_event(IdentityEvent::Other { kind: 304 });

    let report = tick(&mut session, now);

    assert_eq!(report.events_dispatched, 2);
    assert_eq!(report.events_not_handled, 1);
    assert_eq!(session.state(), &ConnectionState::Handshaking);
    assert_eq!(h.identity.pending_events(), 0);
    assert_eq!(session.take_notices(), vec![SessionNotice::ItemCount(3)]);
}

#[test]
fn test_tick_reads_frames_before_callbacks() {
    let h = Harness::new();
    let mut session = h.start();
    let now = session.last_liveness();

    // Server details arrive in the same tick as the connect callback; they
    // are read first, while still Connecting, and dropped.
    h.push(&session, server_info());
    h.connected(&session);
    tick(&mut session, now);

    assert_eq!(session.state(), &ConnectionState::Handshaking);
    assert!(session.server_info().is_none());
}

#[test]
fn test_tick_drops_callbacks_after_terminal_event() {
    let h = Harness::new();
    let mut session = h.start();
    let socket = session.socket().unwrap();
    let now = session.last_liveness();
    h.identity.push_event(IdentityEvent::SocketStatus {
        socket,
        state: SocketState::TimeoutDuringConnect,
    });
    h.identity.push_event(IdentityEvent::ItemCount { count: 1 });

    let report = tick(&mut session, now);

    assert_eq!(report.events_dispatched, 1);
    assert_eq!(
        session.state(),
        &ConnectionState::TransportFailed(FailureCause::ConnectTimeout)
    );
    assert!(session.take_notices().is_empty());
}

// =========================================================================
// Liveness
// =========================================================================

#[test]
fn test_tick_times_out_silent_session() {
    let h = Harness::new();
    let mut session = h.start();
    let t0 = session.last_liveness();

    tick(&mut session, t0 + Duration::from_secs(10));
    assert!(session.is_running());

    tick(&mut session, t0 + Duration::from_secs(31));
    assert_eq!(session.state(), &ConnectionState::TimedOut);
}

#[test]
fn test_tick_ping_frame_refreshes_liveness_at_tick_time() {
    let h = Harness::new();
    let mut session = h.start();
    let t0 = session.last_liveness();
    h.connected(&session);
    tick(&mut session, t0);
    h.push(&session, server_info());
    h.push(&session, InboundMessage::ClientAuthed { motd: String::new() });
    tick(&mut session, t0);

    h.push(&session, InboundMessage::PingRequest { items_total: 2 });
    tick(&mut session, t0 + Duration::from_secs(25));
    tick(&mut session, t0 + Duration::from_secs(50));

    assert_eq!(session.last_liveness(), t0 + Duration::from_secs(25));
    assert_eq!(session.state(), &ConnectionState::Authenticated);
}

#[test]
fn test_tick_on_stopped_session_is_idle() {
    let h = Harness::new();
    let mut session = h.start();
    let now = session.last_liveness();
    session.end();
    h.identity.push_event(IdentityEvent::ItemCount { count: 1 });

    let report = tick(&mut session, now);

    assert!(report.is_idle());
    assert_eq!(h.identity.pending_events(), 1);
}
