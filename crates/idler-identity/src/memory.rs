//! In-process [`IdentityProvider`] with scripted answers.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    IdentityError, IdentityEvent, IdentityProvider, ItemDetails, ItemId,
    PipeHandle, UserHandle,
};

/// A ticket request as seen by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketRequest {
    pub user: UserHandle,
    pub server_id: u64,
    pub remote: SocketAddr,
    pub vac_secure: bool,
}

#[derive(Debug)]
struct Inner {
    persona: String,
    ticket: Vec<u8>,
    items: HashMap<ItemId, ItemDetails>,
    events: VecDeque<IdentityEvent>,
    fail_pipe: bool,
    fail_user: bool,
    next_handle: u32,
    pipes: HashSet<PipeHandle>,
    users: HashSet<UserHandle>,
    ticket_requests: Vec<TicketRequest>,
    loads: u32,
}

/// An [`IdentityProvider`] whose answers are set up by the caller.
///
/// Callbacks are queued with [`push_event`](Self::push_event) and handed
/// out by [`IdentityProvider::drain_events`] in order.
#[derive(Debug)]
pub struct MemoryIdentity {
    inner: Mutex<Inner>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new("idler")
    }
}

impl MemoryIdentity {
    /// A provider for persona `persona` that issues a small non-empty
    /// ticket.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                persona: persona.into(),
                ticket: vec![0x14, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF],
                items: HashMap::new(),
                events: VecDeque::new(),
                fail_pipe: false,
                fail_user: false,
                next_handle: 0,
                pipes: HashSet::new(),
                users: HashSet::new(),
                ticket_requests: Vec::new(),
                loads: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the ticket handed out by [`IdentityProvider::ticket`]. An empty
    /// ticket simulates ticket issuance failure.
    pub fn set_ticket(&self, ticket: Vec<u8>) {
        self.lock().ticket = ticket;
    }

    /// Makes [`IdentityProvider::create_pipe`] fail.
    pub fn fail_pipe(&self, fail: bool) {
        self.lock().fail_pipe = fail;
    }

    /// Makes [`IdentityProvider::connect_user`] fail.
    pub fn fail_user(&self, fail: bool) {
        self.lock().fail_user = fail;
    }

    /// Adds an item to the inventory.
    pub fn add_item(&self, id: ItemId, details: ItemDetails) {
        self.lock().items.insert(id, details);
    }

    /// Queues a callback for the next drain.
    pub fn push_event(&self, event: IdentityEvent) {
        self.lock().events.push_back(event);
    }

    /// Number of callbacks still buffered.
    pub fn pending_events(&self) -> usize {
        self.lock().events.len()
    }

    /// Every ticket request made so far.
    pub fn ticket_requests(&self) -> Vec<TicketRequest> {
        self.lock().ticket_requests.clone()
    }

    /// How many times the inventory was asked to load.
    pub fn load_count(&self) -> u32 {
        self.lock().loads
    }

    /// Number of pipes created and not yet released.
    pub fn live_pipes(&self) -> usize {
        self.lock().pipes.len()
    }

    /// Number of users connected and not yet released.
    pub fn live_users(&self) -> usize {
        self.lock().users.len()
    }
}

impl IdentityProvider for MemoryIdentity {
    fn create_pipe(&self) -> Result<PipeHandle, IdentityError> {
        let mut inner = self.lock();
        if inner.fail_pipe {
            return Err(IdentityError::PipeUnavailable("pipe creation disabled".into()));
        }
        inner.next_handle += 1;
        let pipe = PipeHandle(inner.next_handle);
        inner.pipes.insert(pipe);
        Ok(pipe)
    }

    fn connect_user(&self, pipe: PipeHandle) -> Result<UserHandle, IdentityError> {
        let mut inner = self.lock();
        if inner.fail_user {
            return Err(IdentityError::UserUnavailable("user connection disabled".into()));
        }
        if !inner.pipes.contains(&pipe) {
            return Err(IdentityError::UserUnavailable(format!(
                "pipe {} is not open",
                pipe.0
            )));
        }
        inner.next_handle += 1;
        let user = UserHandle(inner.next_handle);
        inner.users.insert(user);
        Ok(user)
    }

    fn ticket(
        &self,
        user: UserHandle,
        server_id: u64,
        remote: SocketAddr,
        vac_secure: bool,
    ) -> Vec<u8> {
        let mut inner = self.lock();
        inner.ticket_requests.push(TicketRequest {
            user,
            server_id,
            remote,
            vac_secure,
        });
        if inner.users.contains(&user) {
            inner.ticket.clone()
        } else {
            Vec::new()
        }
    }

    fn persona_name(&self) -> String {
        self.lock().persona.clone()
    }

    fn item_by_id(&self, item: ItemId) -> Option<ItemDetails> {
        self.lock().items.get(&item).copied()
    }

    fn load_items(&self) {
        self.lock().loads += 1;
    }

    fn release_user(&self, _pipe: PipeHandle, user: UserHandle) {
        if !self.lock().users.remove(&user) {
            tracing::debug!(user = user.0, "release of unknown user ignored");
        }
    }

    fn release_pipe(&self, pipe: PipeHandle) {
        if !self.lock().pipes.remove(&pipe) {
            tracing::debug!(pipe = pipe.0, "release of unknown pipe ignored");
        }
    }

    fn drain_events(&self) -> Vec<IdentityEvent> {
        self.lock().events.drain(..).collect()
    }
}
