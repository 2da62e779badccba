//! Client session state machine for idler.
//!
//! This crate is the protocol core:
//!
//! 1. **Start-up**: acquire an identity session and a socket
//!    ([`Session::start`])
//! 2. **Dispatch**: apply server messages
//!    ([`Session::on_inbound_message`]) and identity callbacks
//!    ([`Session::on_identity_event`]) to the [`ConnectionState`]
//! 3. **Liveness**: time the session out when pings stop
//!    ([`Session::check_liveness`])
//! 4. **Teardown**: release everything, idempotently ([`Session::end`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Lifecycle driver (above)  ← polls adapters once per tick, feeds the session
//!     ↕
//! Session (this crate)      ← owns the connection state and every transition
//!     ↕
//! Protocol / Transport / Identity (below)
//! ```

mod error;
mod session;
mod state;

pub mod dispatch;

pub use dispatch::Dispatch;
pub use error::ConnectError;
pub use session::{ServerInfo, Session, SessionConfig, SessionNotice};
pub use state::{ConnectionState, FailureCause};
