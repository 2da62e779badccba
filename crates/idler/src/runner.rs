//! Fixed-rate session runner.
//!
//! Calls [`driver::tick`](crate::driver::tick) on a `tokio` interval until
//! the session stops, then tears it down:
//!
//! ```rust,ignore
//! let mut session = Session::start(&transport, &identity, server, SessionConfig::default())?;
//! let outcome = idler::run(&mut session, &RunnerConfig::default()).await;
//! ```
//!
//! Overruns skip missed ticks rather than bursting to catch up. The first
//! tick is delayed by a random jitter so clients started together do not
//! poll in lockstep.

use std::time::Duration;

use idler_identity::IdentityProvider;
use idler_session::{ConnectionState, Session, SessionNotice};
use idler_transport::Transport;
use rand::Rng;
use tokio::time::{self, Instant as TokioInstant, MissedTickBehavior};

use crate::config::RunnerConfig;
use crate::driver::{self, TickReport};

/// Drives `session` until it stops, then ends it.
///
/// Returns the state the session ended in: a terminal state, or `Idle`
/// if it was torn down while still live.
pub async fn run<T, I>(session: &mut Session<'_, T, I>, config: &RunnerConfig) -> ConnectionState
where
    T: Transport,
    I: IdentityProvider,
{
    drive(session, config, None, |_| {}).await
}

/// Like [`run`], but gives up after `max_ticks` ticks.
///
/// A session still running at the limit is ended anyway and reported as
/// `Idle`.
pub async fn run_for_ticks<T, I>(
    session: &mut Session<'_, T, I>,
    config: &RunnerConfig,
    max_ticks: u64,
) -> ConnectionState
where
    T: Transport,
    I: IdentityProvider,
{
    drive(session, config, Some(max_ticks), |_| {}).await
}

/// Like [`run`], handing every [`SessionNotice`] to `on_notice` as soon as
/// the tick that produced it finishes.
pub async fn run_with_notices<T, I, F>(
    session: &mut Session<'_, T, I>,
    config: &RunnerConfig,
    on_notice: F,
) -> ConnectionState
where
    T: Transport,
    I: IdentityProvider,
    F: FnMut(SessionNotice),
{
    drive(session, config, None, on_notice).await
}

async fn drive<T, I, F>(
    session: &mut Session<'_, T, I>,
    config: &RunnerConfig,
    max_ticks: Option<u64>,
    mut on_notice: F,
) -> ConnectionState
where
    T: Transport,
    I: IdentityProvider,
    F: FnMut(SessionNotice),
{
    let config = config.clone().validated();
    let period = config.tick_interval();
    let jitter = initial_jitter(config.initial_jitter_ms);

    tracing::debug!(
        rate_hz = config.tick_rate_hz,
        jitter_ms = jitter.as_millis() as u64,
        max_ticks,
        "session runner started"
    );

    let mut interval = time::interval_at(TokioInstant::now() + jitter, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0u64;
    let mut totals = TickReport::default();

    while session.is_running() {
        if max_ticks.is_some_and(|max| ticks >= max) {
            tracing::info!(ticks, state = session.state().name(), "tick limit reached");
            break;
        }

        let fired_at = interval.tick().await;
        ticks += 1;

        let report = driver::tick(session, fired_at.into_std());
        totals.accumulate(&report);
        for notice in session.take_notices() {
            on_notice(notice);
        }
    }

    session.end();
    let outcome = session.state().clone();

    tracing::info!(
        %outcome,
        ticks,
        frames = totals.frames_dispatched,
        dropped = totals.frames_dropped,
        events = totals.events_dispatched,
        "session runner finished"
    );
    outcome
}

fn initial_jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}
