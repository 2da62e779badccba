//! Event dispatchers.
//!
//! The session has two independent inbound sources and one dispatcher for
//! each. [`inbound`] matches decoded server messages by opcode and
//! [`callbacks`] matches identity-provider callbacks by kind. Both run each
//! handler synchronously to completion, and each handler returns the next
//! [`ConnectionState`](crate::ConnectionState) (or `None` to stay put),
//! which the session applies.

pub mod callbacks;
pub mod inbound;

pub use callbacks::Dispatch;
