//! Identity-provider callback handlers.

use idler_identity::{IdentityEvent, IdentityProvider, ItemId, SocketState};
use idler_protocol::OutboundMessage;
use idler_transport::{SocketHandle, Transport};

use crate::session::SessionNotice;
use crate::{ConnectionState, FailureCause, Session};

/// Whether a callback belonged to the session.
///
/// `NotHandled` lets the caller route the event to whatever else is
/// listening to the provider.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    NotHandled,
}

impl<T: Transport, I: IdentityProvider> Session<'_, T, I> {
    /// Applies one identity-provider callback.
    pub fn on_identity_event(&mut self, event: IdentityEvent) -> Dispatch {
        let next = match event {
            IdentityEvent::SocketStatus { socket, state } => {
                self.handle_socket_status(socket, state)
            }
            IdentityEvent::ItemCount { count } => {
                tracing::info!(count, "inventory loaded");
                self.notices.push(SessionNotice::ItemCount(count));
                None
            }
            IdentityEvent::ItemGranted { item_id } => self.handle_item_granted(item_id),
            IdentityEvent::CallCompleted | IdentityEvent::PersonaStateChange => None,
            IdentityEvent::Other { kind } => {
                tracing::trace!(kind, "callback not handled by session");
                return Dispatch::NotHandled;
            }
        };

        if let Some(next) = next {
            self.transition_to(next);
        }
        Dispatch::Handled
    }

    fn handle_socket_status(
        &mut self,
        socket: SocketHandle,
        state: SocketState,
    ) -> Option<ConnectionState> {
        if self.socket != Some(socket) {
            tracing::debug!(%socket, %state, "status for another socket ignored");
            return None;
        }

        match state {
            SocketState::TimeoutDuringConnect => {
                tracing::warn!(%socket, "unable to connect to destination server");
                Some(ConnectionState::TransportFailed(FailureCause::ConnectTimeout))
            }
            SocketState::Connected => {
                if self.state != ConnectionState::Connecting {
                    tracing::debug!(%socket, state = self.state.name(), "duplicate connect ignored");
                    return None;
                }
                tracing::info!(%socket, "connected to server, initiating handshake");
                Some(self.send_then(
                    &OutboundMessage::ConnectionInit,
                    ConnectionState::Handshaking,
                ))
            }
            SocketState::ConnectionBroken | SocketState::RemoteEndDisconnected => {
                tracing::warn!(%socket, %state, "lost connection to remote server");
                Some(ConnectionState::TransportFailed(FailureCause::ConnectionLost(state)))
            }
            SocketState::Initiated | SocketState::ChallengeHandshake => {
                tracing::debug!(%socket, %state, "connection in progress");
                None
            }
            other => {
                tracing::info!(%socket, state = %other, "socket state changed");
                None
            }
        }
    }

    fn handle_item_granted(&mut self, item_id: ItemId) -> Option<ConnectionState> {
        if self.state != ConnectionState::Authenticated {
            tracing::debug!(%item_id, state = self.state.name(), "item grant before authentication ignored");
            return None;
        }

        let Some(details) = self.identity.item_by_id(item_id) else {
            tracing::warn!(%item_id, "granted item not found in inventory");
            return None;
        };

        tracing::info!(%item_id, item_type = details.item_type, "item granted, reporting to server");
        self.notices.push(SessionNotice::ItemGranted { item_id, details });
        match self.send(&OutboundMessage::ItemGrantedReport {
            item_type: details.item_type,
        }) {
            Ok(()) => None,
            Err(cause) => Some(ConnectionState::TransportFailed(cause)),
        }
    }
}
