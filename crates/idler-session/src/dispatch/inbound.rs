//! Server message handlers.
//!
//! | Message | Accepted in | Next state |
//! |---|---|---|
//! | `ConnectionDenied` | Connecting, Handshaking, Authenticating | Denied |
//! | `ServerSendInfo` | Handshaking | Authenticating |
//! | `ClientAuthed` | Authenticating | Authenticated |
//! | `ClientKicked` | Authenticated | Kicked |
//! | `PingRequest` | Authenticated | Authenticated |
//! | `ItemNameResponse` | Authenticated | unchanged |
//!
//! A message arriving in any other state is dropped.

use std::time::Instant;

use idler_identity::IdentityProvider;
use idler_protocol::{DenyReason, InboundMessage, Opcode, OutboundMessage};
use idler_transport::Transport;

use crate::session::{ServerInfo, SessionNotice};
use crate::{ConnectionState, FailureCause, Session};

impl<T: Transport, I: IdentityProvider> Session<'_, T, I> {
    /// Applies one decoded server message, timestamped now.
    pub fn on_inbound_message(&mut self, msg: InboundMessage) {
        self.on_inbound_message_at(msg, Instant::now());
    }

    /// Applies one decoded server message received at `now`.
    pub fn on_inbound_message_at(&mut self, msg: InboundMessage, now: Instant) {
        if !self.is_running() {
            tracing::debug!(state = %self.state, ?msg, "session not running, message dropped");
            return;
        }

        let next = match msg {
            InboundMessage::ConnectionDenied { reason } => self.handle_denied(reason),
            InboundMessage::ServerSendInfo { server_id, vac_secure } => {
                self.handle_server_info(server_id, vac_secure)
            }
            InboundMessage::ClientAuthed { motd } => self.handle_authed(motd),
            InboundMessage::ClientKicked { message } => self.handle_kicked(message),
            InboundMessage::PingRequest { items_total } => {
                self.handle_ping(items_total, now)
            }
            InboundMessage::ItemNameResponse { name } => self.handle_item_name(name),
            InboundMessage::Unrecognized { opcode } => {
                tracing::info!(
                    opcode,
                    "received unexpected message from server, client is out of date"
                );
                None
            }
        };

        if let Some(next) = next {
            self.transition_to(next);
        }
    }

    fn out_of_order(&self, opcode: Opcode) -> Option<ConnectionState> {
        tracing::debug!(?opcode, state = self.state.name(), "message not expected now, dropped");
        None
    }

    fn handle_denied(&mut self, reason: DenyReason) -> Option<ConnectionState> {
        if !matches!(
            self.state,
            ConnectionState::Connecting
                | ConnectionState::Handshaking
                | ConnectionState::Authenticating
        ) {
            return self.out_of_order(Opcode::ConnectionDenied);
        }

        match reason {
            DenyReason::Invalid(raw) => tracing::warn!(
                reason = raw,
                "connection denied, but an invalid reason was supplied; client is out of date"
            ),
            known => tracing::warn!(reason = known.message(), "connection denied by server"),
        }
        Some(ConnectionState::Denied(reason))
    }

    fn handle_server_info(&mut self, server_id: u64, vac_secure: bool) -> Option<ConnectionState> {
        if self.state != ConnectionState::Handshaking {
            return self.out_of_order(Opcode::ServerSendInfo);
        }

        tracing::info!(server_id, vac_secure, "received server details");
        let info = ServerInfo { server_id, vac_secure };
        self.server = Some(info);
        self.notices.push(SessionNotice::ServerInfo(info));

        tracing::info!("authenticating with server");
        let ticket = match self.user {
            Some(user) => self.identity.ticket(user, server_id, self.remote, vac_secure),
            None => Vec::new(),
        };
        let username = self.identity.persona_name();
        self.identity.load_items();

        if ticket.is_empty() {
            tracing::warn!("identity provider issued no auth ticket");
            return Some(ConnectionState::TransportFailed(FailureCause::TicketUnavailable));
        }

        tracing::debug!(ticket_len = ticket.len(), %username, "sending auth ticket");
        Some(self.send_then(
            &OutboundMessage::AuthTicket { ticket, username },
            ConnectionState::Authenticating,
        ))
    }

    fn handle_authed(&mut self, motd: String) -> Option<ConnectionState> {
        if self.state != ConnectionState::Authenticating {
            return self.out_of_order(Opcode::ClientAuthed);
        }

        tracing::info!(%motd, "authentication completed");
        self.notices.push(SessionNotice::Motd(motd.clone()));
        self.motd = Some(motd);
        Some(ConnectionState::Authenticated)
    }

    fn handle_kicked(&mut self, message: String) -> Option<ConnectionState> {
        if self.state != ConnectionState::Authenticated {
            return self.out_of_order(Opcode::ClientKicked);
        }

        tracing::warn!(%message, "kicked from the server");
        Some(ConnectionState::Kicked { message })
    }

    fn handle_ping(&mut self, items_total: u32, now: Instant) -> Option<ConnectionState> {
        if self.state != ConnectionState::Authenticated {
            return self.out_of_order(Opcode::PingRequest);
        }

        tracing::info!(items_total, "pong");
        self.last_liveness = now;
        self.notices.push(SessionNotice::Ping { items_total });
        Some(self.send_then(&OutboundMessage::PingReply, ConnectionState::Authenticated))
    }

    fn handle_item_name(&mut self, name: String) -> Option<ConnectionState> {
        if self.state != ConnectionState::Authenticated {
            return self.out_of_order(Opcode::ItemNameResponse);
        }

        tracing::info!(item = %name, "you got an item");
        self.notices.push(SessionNotice::ItemName(name));
        None
    }
}
