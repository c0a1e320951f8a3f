//! In-memory storage implementation.
//!
//! This backend keeps all records in RAM. Each instance is isolated, which
//! makes it ideal for parallel test execution; clones of one instance share
//! the same data.

use crate::domain::{LinkId, NewLink, NewTicket, ProjectId, Ticket, TicketId, TicketLink, UserId};
use crate::storage::state::StoreState;
use crate::storage::{LinkStore, ProjectAccess, TicketStore};
use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory storage backend.
///
/// Uses `Arc<RwLock<>>` for shared interior mutability so one store can be
/// handed to several threads.
///
/// # Examples
///
/// ```
/// use taskgraph::storage::{InMemoryStorage, ProjectAccess};
///
/// let storage = InMemoryStorage::new();
/// storage.grant_access(1, 7);
/// assert!(storage.is_member(1, 7).unwrap());
/// assert!(!storage.is_member(2, 7).unwrap());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStorage {
    /// Create a new, empty in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a user is a member of a project.
    ///
    /// Returns false if the membership already existed.
    pub fn grant_access(&self, project_id: ProjectId, user_id: UserId) -> bool {
        self.write().grant(project_id, user_id)
    }

    // A panic while holding the lock cannot leave a half-applied write:
    // every mutation in `StoreState` completes or does nothing.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TicketStore for InMemoryStorage {
    fn init(&self) -> Result<()> {
        // No initialization needed for in-memory storage
        Ok(())
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.read().get_ticket(id))
    }

    fn list_tickets(&self, project_id: ProjectId) -> Result<Vec<Ticket>> {
        Ok(self.read().list_tickets(project_id))
    }

    fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        Ok(self.write().insert_ticket(ticket))
    }

    fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.write().update_ticket(ticket)
    }

    fn delete_ticket(&self, id: TicketId) -> Result<bool> {
        Ok(self.write().delete_ticket(id))
    }
}

impl LinkStore for InMemoryStorage {
    fn insert_link(&self, link: NewLink) -> Result<TicketLink> {
        Ok(self.write().insert_link(link))
    }

    fn get_link(&self, id: LinkId) -> Result<Option<TicketLink>> {
        Ok(self.read().get_link(id))
    }

    fn delete_link(&self, id: LinkId) -> Result<bool> {
        Ok(self.write().delete_link(id))
    }

    fn list_links(&self, project_id: ProjectId) -> Result<Vec<TicketLink>> {
        Ok(self.read().list_links(project_id))
    }

    fn delete_links_for_ticket(&self, ticket_id: TicketId) -> Result<usize> {
        Ok(self.write().delete_links_for_ticket(ticket_id))
    }
}

impl ProjectAccess for InMemoryStorage {
    fn is_member(&self, project_id: ProjectId, user_id: UserId) -> Result<bool> {
        Ok(self.read().is_member(project_id, user_id))
    }
}
