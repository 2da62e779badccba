//! # idler
//!
//! Headless client for an item-granting game server.
//!
//! The protocol logic lives in [`idler_session`]; this crate wires it to a
//! clock. [`driver::tick`] performs one non-blocking pass over the socket,
//! the identity callbacks and the liveness check, and [`runner::run`] calls
//! it at a fixed rate until the session stops.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idler::prelude::*;
//!
//! # async fn demo() -> Result<(), IdlerError> {
//! let config = ClientConfig::from_json_str(r#"{ "server": "203.0.113.7:27015" }"#)?;
//! let transport = MemoryTransport::new();
//! let identity = MemoryIdentity::new("player");
//!
//! let mut session = Session::start(&transport, &identity, config.server, config.session)?;
//! let outcome = run(&mut session, &config.runner).await;
//! println!("session ended: {outcome}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
mod error;
pub mod logging;
pub mod runner;

pub use config::{ClientConfig, RunnerConfig};
pub use driver::{TickReport, tick};
pub use error::IdlerError;
pub use runner::{run, run_for_ticks, run_with_notices};

/// Re-exports everything a client binary usually needs.
pub mod prelude {
    pub use crate::{
        ClientConfig, IdlerError, RunnerConfig, TickReport, run, run_for_ticks,
        run_with_notices, tick,
    };
    pub use idler_identity::{
        IdentityEvent, IdentityError, IdentityProvider, ItemDetails, ItemId, MemoryIdentity,
        SocketState,
    };
    pub use idler_protocol::{
        DenyReason, InboundMessage, Opcode, OutboundMessage, ProtocolError, WireMessage,
    };
    pub use idler_session::{
        ConnectError, ConnectionState, Dispatch, FailureCause, ServerInfo, Session,
        SessionConfig, SessionNotice,
    };
    pub use idler_transport::{MemoryTransport, SocketHandle, Transport, TransportError};
}
