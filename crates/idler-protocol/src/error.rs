//! Error types for the protocol layer.
//!
//! A `ProtocolError` is never fatal to a session. The dispatcher logs it,
//! drops the frame and carries on in the same state.

use crate::Opcode;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame is too short to even carry an opcode.
    #[error("frame of {len} bytes is too short to carry an opcode")]
    Truncated {
        /// Length of the offending frame.
        len: usize,
    },

    /// The frame length does not match the opcode's fixed layout.
    #[error("{opcode:?} frame must be {expected} bytes, got {actual}")]
    LengthMismatch {
        /// The opcode read from the frame.
        opcode: Opcode,
        /// Size declared for that opcode.
        expected: usize,
        /// Size actually received.
        actual: usize,
    },

    /// The opcode is not one this side of the protocol understands.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),

    /// The frame has the right shape but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
