//! Binary codec for the fixed-layout wire messages.
//!
//! Frames are decoded by explicit, bounds-checked reads into owned values.
//! Nothing is ever reinterpreted in place, so a short or oversized frame
//! is a [`ProtocolError`] and never undefined behaviour.
//!
//! ```rust
//! use idler_protocol::{InboundMessage, WireMessage};
//!
//! let ping = InboundMessage::PingRequest { items_total: 3 };
//! let bytes = ping.encode().unwrap();
//! assert_eq!(bytes, [5, 0, 0, 0, 3, 0, 0, 0]);
//! assert_eq!(InboundMessage::decode(&bytes).unwrap(), ping);
//! ```

use crate::types::{
    AUTH_TICKET_SIZE, ITEM_NAME_SIZE, KICK_MESSAGE_SIZE, MOTD_SIZE,
    OPCODE_SIZE, USERNAME_SIZE,
};
use crate::{DenyReason, InboundMessage, Opcode, OutboundMessage, ProtocolError};

/// A message with a fixed binary layout.
pub trait WireMessage: Sized {
    /// Serializes the message into one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if a field does not fit its
    /// fixed-size slot.
    fn encode(&self) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Truncated`] or
    /// [`ProtocolError::LengthMismatch`] when the frame does not have the
    /// opcode's exact size.
    fn decode(frame: &[u8]) -> Result<Self, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Inbound (server → client)
// ---------------------------------------------------------------------------

impl WireMessage for InboundMessage {
    fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let out = match self {
            Self::ConnectionDenied { reason } => {
                let mut out = FrameWriter::new(Opcode::ConnectionDenied);
                out.u32(reason.as_u32());
                out
            }
            Self::ServerSendInfo { server_id, vac_secure } => {
                let mut out = FrameWriter::new(Opcode::ServerSendInfo);
                out.u64(*server_id);
                out.u8(u8::from(*vac_secure));
                out
            }
            Self::ClientAuthed { motd } => {
                let mut out = FrameWriter::new(Opcode::ClientAuthed);
                out.c_string(motd, MOTD_SIZE);
                out
            }
            Self::ClientKicked { message } => {
                let mut out = FrameWriter::new(Opcode::ClientKicked);
                out.c_string(message, KICK_MESSAGE_SIZE);
                out
            }
            Self::PingRequest { items_total } => {
                let mut out = FrameWriter::new(Opcode::PingRequest);
                out.u32(*items_total);
                out
            }
            Self::ItemNameResponse { name } => {
                let mut out = FrameWriter::new(Opcode::ItemNameResponse);
                out.c_string(name, ITEM_NAME_SIZE);
                out
            }
            // Unrecognized frames only carry their opcode.
            Self::Unrecognized { opcode } => return Ok(opcode.to_le_bytes().to_vec()),
        };
        Ok(out.finish())
    }

    fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let raw = read_opcode(frame)?;
        let opcode = match Opcode::from_u32(raw) {
            Some(op) if op.is_server_message() => op,
            _ => return Ok(Self::Unrecognized { opcode: raw }),
        };
        let mut r = FrameReader::new(opcode, frame)?;

        Ok(match opcode {
            Opcode::ConnectionDenied => Self::ConnectionDenied {
                reason: DenyReason::from_u32(r.u32()?),
            },
            Opcode::ServerSendInfo => Self::ServerSendInfo {
                server_id: r.u64()?,
                vac_secure: r.u8()? != 0,
            },
            Opcode::ClientAuthed => Self::ClientAuthed {
                motd: r.c_string(MOTD_SIZE)?,
            },
            Opcode::ClientKicked => Self::ClientKicked {
                message: r.c_string(KICK_MESSAGE_SIZE)?,
            },
            Opcode::PingRequest => Self::PingRequest {
                items_total: r.u32()?,
            },
            Opcode::ItemNameResponse => Self::ItemNameResponse {
                name: r.c_string(ITEM_NAME_SIZE)?,
            },
            // Filtered out above by `is_server_message`.
            Opcode::ConnectionInit
            | Opcode::AuthTicket
            | Opcode::PingReply
            | Opcode::ItemGrantedReport => {
                return Ok(Self::Unrecognized { opcode: raw });
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Outbound (client → server)
// ---------------------------------------------------------------------------

impl WireMessage for OutboundMessage {
    fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = FrameWriter::new(self.opcode());
        match self {
            Self::ConnectionInit | Self::PingReply => {}
            Self::AuthTicket { ticket, username } => {
                if ticket.len() > AUTH_TICKET_SIZE {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "auth ticket of {} bytes exceeds {AUTH_TICKET_SIZE}",
                        ticket.len()
                    )));
                }
                // Bounded by AUTH_TICKET_SIZE just above.
                out.u32(ticket.len() as u32);
                out.padded(ticket, AUTH_TICKET_SIZE);
                out.c_string(username, USERNAME_SIZE);
            }
            Self::ItemGrantedReport { item_type } => out.u32(*item_type),
        }
        Ok(out.finish())
    }

    fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let raw = read_opcode(frame)?;
        let opcode = match Opcode::from_u32(raw) {
            Some(op) if !op.is_server_message() => op,
            _ => return Err(ProtocolError::UnknownOpcode(raw)),
        };
        let mut r = FrameReader::new(opcode, frame)?;

        Ok(match opcode {
            Opcode::ConnectionInit => Self::ConnectionInit,
            Opcode::PingReply => Self::PingReply,
            Opcode::AuthTicket => {
                let len = r.u32()? as usize;
                if len > AUTH_TICKET_SIZE {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "ticket length {len} exceeds {AUTH_TICKET_SIZE}"
                    )));
                }
                let slot = r.bytes(AUTH_TICKET_SIZE)?;
                Self::AuthTicket {
                    ticket: slot[..len].to_vec(),
                    username: r.c_string(USERNAME_SIZE)?,
                }
            }
            Opcode::ItemGrantedReport => Self::ItemGrantedReport {
                item_type: r.u32()?,
            },
            _ => return Err(ProtocolError::UnknownOpcode(raw)),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_opcode(frame: &[u8]) -> Result<u32, ProtocolError> {
    let head: [u8; OPCODE_SIZE] = frame
        .get(..OPCODE_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or(ProtocolError::Truncated { len: frame.len() })?;
    Ok(u32::from_le_bytes(head))
}

/// Cursor over the payload of a frame whose length was already validated.
struct FrameReader<'a> {
    opcode: Opcode,
    frame: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(opcode: Opcode, frame: &'a [u8]) -> Result<Self, ProtocolError> {
        let expected = opcode.frame_size();
        if frame.len() != expected {
            return Err(ProtocolError::LengthMismatch {
                opcode,
                expected,
                actual: frame.len(),
            });
        }
        Ok(Self {
            opcode,
            frame,
            pos: OPCODE_SIZE,
        })
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let slice = self.frame.get(self.pos..self.pos + n).ok_or(
            ProtocolError::LengthMismatch {
                opcode: self.opcode,
                expected: self.opcode.frame_size(),
                actual: self.frame.len(),
            },
        )?;
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, ProtocolError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    /// Reads a NUL-terminated string out of a fixed `size` buffer. A buffer
    /// with no NUL is taken whole.
    fn c_string(&mut self, size: usize) -> Result<String, ProtocolError> {
        let slot = self.bytes(size)?;
        let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
        Ok(String::from_utf8_lossy(&slot[..end]).into_owned())
    }
}

struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    fn new(opcode: Opcode) -> Self {
        let mut buf = Vec::with_capacity(opcode.frame_size());
        buf.extend_from_slice(&opcode.as_u32().to_le_bytes());
        Self { buf }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Writes `data` into a zero-padded slot of exactly `size` bytes.
    fn padded(&mut self, data: &[u8], size: usize) {
        let n = data.len().min(size);
        self.buf.extend_from_slice(&data[..n]);
        self.buf.resize(self.buf.len() + (size - n), 0);
    }

    /// Writes `s` as a NUL-terminated string in a fixed `size` slot,
    /// truncating on a char boundary so the terminator always fits.
    fn c_string(&mut self, s: &str, size: usize) {
        let mut end = s.len().min(size.saturating_sub(1));
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.padded(&s.as_bytes()[..end], size);
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(opcode: u32, payload: &[u8]) -> Vec<u8> {
        let mut f = opcode.to_le_bytes().to_vec();
        f.extend_from_slice(payload);
        f
    }

    // =====================================================================
    // Inbound decode
    // =====================================================================

    #[test]
    fn test_decode_connection_denied_reads_reason() {
        let msg = InboundMessage::decode(&frame(2, &3u32.to_le_bytes())).unwrap();
        assert_eq!(
            msg,
            InboundMessage::ConnectionDenied {
                reason: DenyReason::AuthFailed
            }
        );
    }

    #[test]
    fn test_decode_server_send_info_little_endian() {
        let mut payload = 0x0110_0001_0000_0042u64.to_le_bytes().to_vec();
        payload.push(1);

        let msg = InboundMessage::decode(&frame(1, &payload)).unwrap();

        assert_eq!(
            msg,
            InboundMessage::ServerSendInfo {
                server_id: 0x0110_0001_0000_0042,
                vac_secure: true,
            }
        );
    }

    #[test]
    fn test_decode_motd_stops_at_nul() {
        let mut payload = vec![0u8; MOTD_SIZE];
        payload[..5].copy_from_slice(b"hello");
        payload[6..11].copy_from_slice(b"trash");

        let msg = InboundMessage::decode(&frame(3, &payload)).unwrap();

        assert_eq!(msg, InboundMessage::ClientAuthed { motd: "hello".into() });
    }

    #[test]
    fn test_decode_unterminated_buffer_takes_whole_slot() {
        let payload = vec![b'a'; ITEM_NAME_SIZE];

        let msg = InboundMessage::decode(&frame(6, &payload)).unwrap();

        let InboundMessage::ItemNameResponse { name } = msg else {
            panic!("expected ItemNameResponse, got {msg:?}");
        };
        assert_eq!(name.len(), ITEM_NAME_SIZE);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut payload = vec![0u8; KICK_MESSAGE_SIZE];
        payload[..3].copy_from_slice(&[b'o', 0xFF, b'k']);

        let msg = InboundMessage::decode(&frame(4, &payload)).unwrap();

        assert_eq!(
            msg,
            InboundMessage::ClientKicked {
                message: "o\u{FFFD}k".into()
            }
        );
    }

    #[test]
    fn test_decode_short_frame_returns_length_mismatch() {
        let result = InboundMessage::decode(&frame(5, &[1, 0]));

        assert_eq!(
            result,
            Err(ProtocolError::LengthMismatch {
                opcode: Opcode::PingRequest,
                expected: 8,
                actual: 6,
            })
        );
    }

    #[test]
    fn test_decode_long_frame_returns_length_mismatch() {
        let result = InboundMessage::decode(&frame(2, &[0; 8]));
        assert!(matches!(result, Err(ProtocolError::LengthMismatch { .. })));
    }

    #[test]
    fn test_decode_frame_without_opcode_returns_truncated() {
        assert_eq!(
            InboundMessage::decode(&[1, 0]),
            Err(ProtocolError::Truncated { len: 2 })
        );
        assert_eq!(
            InboundMessage::decode(&[]),
            Err(ProtocolError::Truncated { len: 0 })
        );
    }

    #[test]
    fn test_decode_unknown_opcode_is_unrecognized() {
        let msg = InboundMessage::decode(&frame(42, &[1, 2, 3])).unwrap();
        assert_eq!(msg, InboundMessage::Unrecognized { opcode: 42 });
    }

    #[test]
    fn test_decode_client_opcode_as_inbound_is_unrecognized() {
        let msg = InboundMessage::decode(&frame(503, &[])).unwrap();
        assert_eq!(msg, InboundMessage::Unrecognized { opcode: 503 });
    }

    // =====================================================================
    // Outbound encode
    // =====================================================================

    #[test]
    fn test_encode_inbound_frames_have_declared_size() {
        let messages = [
            InboundMessage::ServerSendInfo { server_id: 1, vac_secure: true },
            InboundMessage::ConnectionDenied { reason: DenyReason::AuthFailed },
            InboundMessage::ClientAuthed { motd: "hello".into() },
            InboundMessage::ClientKicked { message: "bye".into() },
            InboundMessage::PingRequest { items_total: 2 },
            InboundMessage::ItemNameResponse { name: "Hat".into() },
        ];
        for msg in messages {
            let opcode = msg.opcode().expect("server messages have an opcode");
            let bytes = msg.encode().unwrap();
            assert_eq!(bytes.len(), opcode.frame_size(), "{opcode:?}");
            assert_eq!(bytes[..4], opcode.as_u32().to_le_bytes());
        }
    }

    #[test]
    fn test_encode_unrecognized_is_bare_opcode() {
        let bytes = InboundMessage::Unrecognized { opcode: 900 }.encode().unwrap();
        assert_eq!(bytes, 900u32.to_le_bytes());
    }

    #[test]
    fn test_encode_empty_payload_messages() {
        assert_eq!(
            OutboundMessage::ConnectionInit.encode().unwrap(),
            501u32.to_le_bytes()
        );
        assert_eq!(
            OutboundMessage::PingReply.encode().unwrap(),
            503u32.to_le_bytes()
        );
    }

    #[test]
    fn test_encode_auth_ticket_layout() {
        let msg = OutboundMessage::AuthTicket {
            ticket: vec![0xAA, 0xBB, 0xCC],
            username: "idler".into(),
        };

        let bytes = msg.encode().unwrap();

        assert_eq!(bytes.len(), Opcode::AuthTicket.frame_size());
        assert_eq!(&bytes[..4], &502u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &3u32.to_le_bytes());
        assert_eq!(&bytes[8..11], &[0xAA, 0xBB, 0xCC]);
        assert!(bytes[11..8 + AUTH_TICKET_SIZE].iter().all(|&b| b == 0));
        let name_at = 8 + AUTH_TICKET_SIZE;
        assert_eq!(&bytes[name_at..name_at + 6], b"idler\0");

        assert_eq!(OutboundMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_encode_auth_ticket_oversized_is_rejected() {
        let msg = OutboundMessage::AuthTicket {
            ticket: vec![1; AUTH_TICKET_SIZE + 1],
            username: String::new(),
        };
        assert!(matches!(
            msg.encode(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_encode_long_username_truncates_on_char_boundary() {
        // 40 two-byte chars = 80 bytes, slot holds 63 plus NUL.
        let msg = OutboundMessage::AuthTicket {
            ticket: vec![1],
            username: "é".repeat(40),
        };

        let decoded = OutboundMessage::decode(&msg.encode().unwrap()).unwrap();

        let OutboundMessage::AuthTicket { username, .. } = decoded else {
            panic!("expected AuthTicket");
        };
        assert_eq!(username, "é".repeat(31));
    }

    #[test]
    fn test_decode_outbound_ticket_length_over_slot_is_invalid() {
        let mut bytes = OutboundMessage::AuthTicket {
            ticket: vec![],
            username: String::new(),
        }
        .encode()
        .unwrap();
        bytes[4..8].copy_from_slice(&(AUTH_TICKET_SIZE as u32 + 1).to_le_bytes());

        assert!(matches!(
            OutboundMessage::decode(&bytes),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_decode_outbound_rejects_server_opcode() {
        let bytes = InboundMessage::PingRequest { items_total: 0 }
            .encode()
            .unwrap();
        assert_eq!(
            OutboundMessage::decode(&bytes),
            Err(ProtocolError::UnknownOpcode(5))
        );
    }

    #[test]
    fn test_encode_item_granted_report() {
        let bytes = OutboundMessage::ItemGrantedReport { item_type: 0x1234 }
            .encode()
            .unwrap();
        assert_eq!(bytes, frame(504, &0x1234u32.to_le_bytes()));
    }
}
