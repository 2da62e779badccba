//! Identity adapter for idler.
//!
//! idler does not implement identity itself. Authentication tickets, the
//! persona name, inventory lookups and socket presence callbacks all come
//! from an external provider, reached through the [`IdentityProvider`]
//! trait. The session core calls it during start-up, during the handshake
//! and when an item is granted; the lifecycle driver drains its buffered
//! [`IdentityEvent`]s once per tick.
//!
//! # Why a trait?
//!
//! The provider is a vendor service in production, a scripted double in
//! tests ([`MemoryIdentity`]), and the core code is the same for both.

mod error;
mod event;
#[cfg(feature = "memory")]
mod memory;

pub use error::IdentityError;
pub use event::{IdentityEvent, SocketState};
#[cfg(feature = "memory")]
pub use memory::{MemoryIdentity, TicketRequest};

use std::fmt;
use std::net::SocketAddr;

/// Handle to a communication pipe with the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipeHandle(pub u32);

/// Handle to the local user attached to a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserHandle(pub u32);

/// Inventory item identifier. Passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Details of one inventory item as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemDetails {
    pub item_type: u32,
    pub level: u32,
    pub quality: u32,
    pub flags: u32,
    pub quantity: u32,
    pub attribute_count: u32,
}

/// The external identity, ticketing and presence service.
///
/// All methods are synchronous and return immediately.
pub trait IdentityProvider {
    /// Opens a pipe to the identity service.
    fn create_pipe(&self) -> Result<PipeHandle, IdentityError>;

    /// Attaches the local user to `pipe`.
    fn connect_user(&self, pipe: PipeHandle) -> Result<UserHandle, IdentityError>;

    /// Issues an authentication ticket for the given server.
    ///
    /// An empty ticket means the provider could not issue one.
    fn ticket(
        &self,
        user: UserHandle,
        server_id: u64,
        remote: SocketAddr,
        vac_secure: bool,
    ) -> Vec<u8>;

    /// The user's display name.
    fn persona_name(&self) -> String;

    /// Looks up an item the user owns.
    fn item_by_id(&self, item: ItemId) -> Option<ItemDetails>;

    /// Asks the provider to load the inventory. Completion is reported
    /// later as [`IdentityEvent::ItemCount`].
    fn load_items(&self);

    /// Detaches `user` from `pipe`.
    fn release_user(&self, pipe: PipeHandle, user: UserHandle);

    /// Closes `pipe`.
    fn release_pipe(&self, pipe: PipeHandle);

    /// Removes and returns every callback buffered so far.
    fn drain_events(&self) -> Vec<IdentityEvent>;
}
