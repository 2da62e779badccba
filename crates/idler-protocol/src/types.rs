//! Message types exchanged between the client and the application server.
//!
//! Every frame on the wire starts with a little-endian `u32` opcode followed
//! by a fixed-size payload. The two directions are kept as two separate
//! enums: [`InboundMessage`] (server → client) and [`OutboundMessage`]
//! (client → server). The client never decodes its own message set as
//! inbound traffic; such frames come out as
//! [`InboundMessage::Unrecognized`].

use std::fmt;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Size of the opcode that prefixes every frame.
pub const OPCODE_SIZE: usize = 4;
/// Fixed buffer holding the NUL-terminated message of the day.
pub const MOTD_SIZE: usize = 256;
/// Fixed buffer holding the NUL-terminated kick message.
pub const KICK_MESSAGE_SIZE: usize = 256;
/// Fixed buffer holding the NUL-terminated item name.
pub const ITEM_NAME_SIZE: usize = 128;
/// Maximum authentication ticket size.
pub const AUTH_TICKET_SIZE: usize = 1024;
/// Fixed buffer holding the NUL-terminated persona name.
pub const USERNAME_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// Discriminator at the start of every frame.
///
/// Server messages live in `1..=6`, client messages in `501..=504`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Server id and VAC flag, sent once the client has said hello.
    ServerSendInfo,
    /// The server refuses the connection.
    ConnectionDenied,
    /// The auth ticket was accepted; carries the message of the day.
    ClientAuthed,
    /// The server removes an authenticated client.
    ClientKicked,
    /// Keep-alive from the server, with its item total.
    PingRequest,
    /// Display name of an item the client reported.
    ItemNameResponse,
    /// Client hello, sent when the socket connects.
    ConnectionInit,
    /// Client auth ticket and persona name.
    AuthTicket,
    /// Client answer to a ping.
    PingReply,
    /// Client report of a newly granted item's type.
    ItemGrantedReport,
}

impl Opcode {
    /// Maps a raw wire value to an opcode.
    pub fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::ServerSendInfo,
            2 => Self::ConnectionDenied,
            3 => Self::ClientAuthed,
            4 => Self::ClientKicked,
            5 => Self::PingRequest,
            6 => Self::ItemNameResponse,
            501 => Self::ConnectionInit,
            502 => Self::AuthTicket,
            503 => Self::PingReply,
            504 => Self::ItemGrantedReport,
            _ => return None,
        })
    }

    /// The raw wire value.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::ServerSendInfo => 1,
            Self::ConnectionDenied => 2,
            Self::ClientAuthed => 3,
            Self::ClientKicked => 4,
            Self::PingRequest => 5,
            Self::ItemNameResponse => 6,
            Self::ConnectionInit => 501,
            Self::AuthTicket => 502,
            Self::PingReply => 503,
            Self::ItemGrantedReport => 504,
        }
    }

    /// Total frame size for this opcode, opcode included.
    pub fn frame_size(self) -> usize {
        OPCODE_SIZE
            + match self {
                Self::ServerSendInfo => 8 + 1,
                Self::ConnectionDenied => 4,
                Self::ClientAuthed => MOTD_SIZE,
                Self::ClientKicked => KICK_MESSAGE_SIZE,
                Self::PingRequest => 4,
                Self::ItemNameResponse => ITEM_NAME_SIZE,
                Self::ConnectionInit | Self::PingReply => 0,
                Self::AuthTicket => 4 + AUTH_TICKET_SIZE + USERNAME_SIZE,
                Self::ItemGrantedReport => 4,
            }
    }

    /// `true` for opcodes the server sends to the client.
    pub fn is_server_message(self) -> bool {
        self.as_u32() < 500
    }
}

// ---------------------------------------------------------------------------
// DenyReason
// ---------------------------------------------------------------------------

/// Why the server refused the connection.
///
/// The known reasons form a closed set. A value outside it is kept as
/// [`DenyReason::Invalid`] so an older client can still report it instead of
/// failing to decode the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// The server gave no reason.
    Unknown,
    /// No free slots.
    ServerFull,
    /// The account is banned from this server.
    SteamIdBanned,
    /// The auth ticket was rejected.
    AuthFailed,
    /// The same account is already connected.
    SteamIdExists,
    /// A value this client does not know about.
    Invalid(u32),
}

impl DenyReason {
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            0 => Self::Unknown,
            1 => Self::ServerFull,
            2 => Self::SteamIdBanned,
            3 => Self::AuthFailed,
            4 => Self::SteamIdExists,
            other => Self::Invalid(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::ServerFull => 1,
            Self::SteamIdBanned => 2,
            Self::AuthFailed => 3,
            Self::SteamIdExists => 4,
            Self::Invalid(raw) => raw,
        }
    }

    /// Human-readable explanation shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            Self::Unknown => "The server did not give a reason.",
            Self::ServerFull => "Server is full.",
            Self::SteamIdBanned => "You are banned.",
            Self::AuthFailed => "Authentication failure.",
            Self::SteamIdExists => "SteamID is already present on server.",
            Self::Invalid(_) => {
                "An invalid reason was supplied. Your client is out of date."
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(raw) => write!(f, "{} (reason {raw})", self.message()),
            _ => f.write_str(self.message()),
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A decoded server → client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// The server refused the connection.
    ConnectionDenied { reason: DenyReason },

    /// Server identity, sent in reply to `ConnectionInit`.
    ServerSendInfo { server_id: u64, vac_secure: bool },

    /// The auth ticket was accepted.
    ClientAuthed { motd: String },

    /// The server removed us.
    ClientKicked { message: String },

    /// Liveness probe. `items_total` is informational.
    PingRequest { items_total: u32 },

    /// Name of an item we reported as granted.
    ItemNameResponse { name: String },

    /// A frame whose opcode is not a server message this client knows.
    Unrecognized { opcode: u32 },
}

impl InboundMessage {
    /// The opcode this message travels under, `None` for
    /// [`Unrecognized`](Self::Unrecognized).
    pub fn opcode(&self) -> Option<Opcode> {
        Some(match self {
            Self::ConnectionDenied { .. } => Opcode::ConnectionDenied,
            Self::ServerSendInfo { .. } => Opcode::ServerSendInfo,
            Self::ClientAuthed { .. } => Opcode::ClientAuthed,
            Self::ClientKicked { .. } => Opcode::ClientKicked,
            Self::PingRequest { .. } => Opcode::PingRequest,
            Self::ItemNameResponse { .. } => Opcode::ItemNameResponse,
            Self::Unrecognized { .. } => return None,
        })
    }
}

/// A client → server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Opens the handshake once the socket is connected.
    ConnectionInit,

    /// Identity ticket plus the persona name to display.
    AuthTicket { ticket: Vec<u8>, username: String },

    /// Answer to a `PingRequest`.
    PingReply,

    /// Tells the server we were granted an item of this type.
    ItemGrantedReport { item_type: u32 },
}

impl OutboundMessage {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::ConnectionInit => Opcode::ConnectionInit,
            Self::AuthTicket { .. } => Opcode::AuthTicket,
            Self::PingReply => Opcode::PingReply,
            Self::ItemGrantedReport { .. } => Opcode::ItemGrantedReport,
        }
    }
}
