//! Loopback demo: one client session against a scripted server, all in
//! memory.
//!
//! The "server" completes the handshake, grants an item, sends a few pings
//! and then kicks the client. Run with `RUST_LOG=debug` to see every state
//! change, or pass a JSON config path as the first argument.

use std::time::Duration;

use idler::prelude::*;

const GRANTED_ITEM: ItemId = ItemId(5_001);
const PINGS: u32 = 3;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    idler::logging::init("info");

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ClientConfig::default(),
    };

    let transport = MemoryTransport::new();
    let identity = MemoryIdentity::new("loopback");
    identity.add_item(
        GRANTED_ITEM,
        ItemDetails {
            item_type: 190,
            level: 5,
            quality: 6,
            quantity: 1,
            ..ItemDetails::default()
        },
    );

    let mut session = Session::start(&transport, &identity, config.server, config.session.clone())?;
    let Some(socket) = session.socket() else {
        return Err("session started without a socket".into());
    };

    let (outcome, served) = tokio::join!(
        run_with_notices(&mut session, &config.runner, |notice| {
            tracing::info!(?notice, "notice");
        }),
        serve(&transport, &identity, socket),
    );
    served?;

    tracing::info!(%outcome, "client finished");
    Ok(())
}

/// Plays the application server and the identity service's callbacks.
async fn serve(
    transport: &MemoryTransport,
    identity: &MemoryIdentity,
    socket: SocketHandle,
) -> Result<(), IdlerError> {
    identity.push_event(IdentityEvent::SocketStatus {
        socket,
        state: SocketState::Connected,
    });

    let mut authed = false;
    let mut pings_left = PINGS;
    let reply = |msg: InboundMessage| -> Result<(), IdlerError> {
        transport.push_inbound(socket, msg.encode()?);
        Ok(())
    };

    while transport.is_open(socket) {
        for frame in transport.take_sent(socket) {
            match OutboundMessage::decode(&frame)? {
                OutboundMessage::ConnectionInit => reply(InboundMessage::ServerSendInfo {
                    server_id: 0x0110_0001_0000_0042,
                    vac_secure: true,
                })?,
                OutboundMessage::AuthTicket { ticket, username } => {
                    tracing::info!(%username, ticket_len = ticket.len(), "server: ticket accepted");
                    authed = true;
                    reply(InboundMessage::ClientAuthed {
                        motd: "Welcome to the loopback server".into(),
                    })?;
                    identity.push_event(IdentityEvent::ItemGranted {
                        item_id: GRANTED_ITEM,
                    });
                }
                OutboundMessage::ItemGrantedReport { item_type } => {
                    reply(InboundMessage::ItemNameResponse {
                        name: format!("Item #{item_type}"),
                    })?
                }
                OutboundMessage::PingReply => tracing::debug!("server: pong received"),
            }
        }

        tokio::time::sleep(Duration::from_secs(1)).await;

        if authed && transport.is_open(socket) {
            if pings_left > 0 {
                pings_left -= 1;
                reply(InboundMessage::PingRequest { items_total: 1 })?;
            } else {
                reply(InboundMessage::ClientKicked {
                    message: "demo over".into(),
                })?;
            }
        }
    }
    Ok(())
}
