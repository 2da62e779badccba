//! Wire protocol for idler.
//!
//! This crate defines the fixed message set the client and the application
//! server exchange, and the binary codec for it:
//!
//! - **Types** ([`InboundMessage`], [`OutboundMessage`], [`Opcode`],
//!   [`DenyReason`]): one enum per direction.
//! - **Codec** ([`WireMessage`]): bounds-checked little-endian
//!   encode/decode of fixed-layout frames.
//! - **Errors** ([`ProtocolError`]): malformed frames. Never fatal.
//!
//! ```text
//! Transport (frames) → Protocol (InboundMessage) → Session (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::WireMessage;
pub use error::ProtocolError;
pub use types::{
    AUTH_TICKET_SIZE, DenyReason, ITEM_NAME_SIZE, InboundMessage,
    KICK_MESSAGE_SIZE, MOTD_SIZE, OPCODE_SIZE, Opcode, OutboundMessage,
    USERNAME_SIZE,
};
