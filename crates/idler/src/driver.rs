//! One non-blocking pass over everything a session has to react to.
//!
//! Each [`tick`]:
//!
//! 1. retrieves, decodes and dispatches the frames the transport had
//!    waiting when the tick began (later arrivals wait for the next tick),
//! 2. drains and dispatches the identity provider's queued callbacks,
//! 3. checks the liveness timeout.
//!
//! Processing stops as soon as the session stops running; whatever is
//! still queued is left for nobody. Malformed frames are dropped and
//! counted, never fatal.

use std::time::Instant;

use idler_identity::IdentityProvider;
use idler_protocol::{InboundMessage, WireMessage};
use idler_session::{Dispatch, Session};
use idler_transport::Transport;

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frames decoded and handed to the session.
    pub frames_dispatched: u32,
    /// Frames that failed to decode.
    pub frames_dropped: u32,
    /// Identity callbacks the session handled.
    pub events_dispatched: u32,
    /// Identity callbacks the session did not recognize.
    pub events_not_handled: u32,
}

impl TickReport {
    /// Whether the tick saw any input at all.
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    /// Adds another report's counters to this one.
    pub fn accumulate(&mut self, other: &TickReport) {
        self.frames_dispatched += other.frames_dispatched;
        self.frames_dropped += other.frames_dropped;
        self.events_dispatched += other.events_dispatched;
        self.events_not_handled += other.events_not_handled;
    }
}

/// Drives `session` once, treating `now` as the current time.
///
/// Never blocks. Calling it on a stopped session does nothing.
pub fn tick<T, I>(session: &mut Session<'_, T, I>, now: Instant) -> TickReport
where
    T: Transport,
    I: IdentityProvider,
{
    let mut report = TickReport::default();
    if !session.is_running() {
        return report;
    }

    pump_frames(session, now, &mut report);
    if session.is_running() {
        pump_events(session, &mut report);
    }
    session.check_liveness(now);

    if !report.is_idle() {
        tracing::trace!(?report, state = session.state().name(), "tick processed input");
    }
    report
}

fn pump_frames<T, I>(session: &mut Session<'_, T, I>, now: Instant, report: &mut TickReport)
where
    T: Transport,
    I: IdentityProvider,
{
    let Some(socket) = session.socket() else {
        return;
    };
    let transport = session.transport();
    let buffered = transport.pending(socket);

    for _ in 0..buffered {
        if !session.is_running() {
            break;
        }
        let Some(size) = transport.available(socket) else {
            break;
        };

        let frame = match transport.retrieve(socket, size) {
            Ok(frame) => frame,
            Err(e) => {
                session.on_receive_failure(&e);
                break;
            }
        };

        match InboundMessage::decode(&frame) {
            Ok(msg) => {
                report.frames_dispatched += 1;
                session.on_inbound_message_at(msg, now);
            }
            Err(e) => {
                report.frames_dropped += 1;
                tracing::debug!(%socket, len = frame.len(), error = %e, "malformed frame dropped");
            }
        }
    }
}

fn pump_events<T, I>(session: &mut Session<'_, T, I>, report: &mut TickReport)
where
    T: Transport,
    I: IdentityProvider,
{
    for event in session.identity().drain_events() {
        if !session.is_running() {
            tracing::debug!(?event, "session stopped, remaining callbacks dropped");
            break;
        }
        match session.on_identity_event(event) {
            Dispatch::Handled => report.events_dispatched += 1,
            Dispatch::NotHandled => report.events_not_handled += 1,
        }
    }
}
