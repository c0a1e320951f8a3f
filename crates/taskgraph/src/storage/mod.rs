//! Storage abstraction layer for tickets, links and project membership.
//!
//! The engine never talks to a database directly. It reaches persistence
//! through three narrow collaborator traits:
//!
//! - [`TicketStore`]: fetch, list, create, update and delete tickets
//! - [`LinkStore`]: create, delete and list explicit links
//! - [`ProjectAccess`]: membership check run by the surrounding service
//!
//! Two backends are provided: [`InMemoryStorage`] for tests and embedding,
//! and [`JsonFileStorage`] which persists the same state to disk.

use crate::domain::{LinkId, NewLink, NewTicket, ProjectId, Ticket, TicketId, TicketLink, UserId};
use crate::errors::TrackerError;
use anyhow::Result;

pub mod json;
pub mod memory;
pub mod project_lock;
mod state;

// Re-export for convenience
pub use json::JsonFileStorage;
pub use memory::InMemoryStorage;
pub use project_lock::ProjectLocks;

/// Ticket lookup and persistence collaborator.
///
/// Implementations must be cheap to clone; clones share the same data.
///
/// # Examples
///
/// ```
/// use taskgraph::domain::{NewTicket, TicketType};
/// use taskgraph::storage::{InMemoryStorage, TicketStore};
///
/// let storage = InMemoryStorage::new();
/// storage.init().unwrap();
///
/// let ticket = storage
///     .insert_ticket(NewTicket {
///         title: "Fix login".to_string(),
///         description: String::new(),
///         status: "new".to_string(),
///         priority: "high".to_string(),
///         ticket_type: TicketType::Task,
///         parent_id: None,
///         project_id: 1,
///         reporter_id: 7,
///         assignee_id: None,
///     })
///     .unwrap();
///
/// let loaded = storage.get_ticket(ticket.id).unwrap().unwrap();
/// assert_eq!(loaded.title, "Fix login");
/// ```
pub trait TicketStore: Clone + Send + Sync {
    /// Initialize the storage backend (idempotent).
    fn init(&self) -> Result<()>;

    /// Fetch a ticket by identifier. Returns `Ok(None)` if it does not exist.
    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;

    /// List all tickets of a project in ascending identifier order.
    fn list_tickets(&self, project_id: ProjectId) -> Result<Vec<Ticket>>;

    /// Store a new ticket, assigning its identifier and timestamps.
    fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket>;

    /// Overwrite an existing ticket record.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket does not exist or cannot be persisted.
    fn update_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Delete a ticket record. Returns `false` if it did not exist.
    fn delete_ticket(&self, id: TicketId) -> Result<bool>;
}

/// Link lookup and persistence collaborator.
pub trait LinkStore: Clone + Send + Sync {
    /// Store a new link, assigning its identifier and creation timestamp.
    fn insert_link(&self, link: NewLink) -> Result<TicketLink>;

    /// Fetch a link by identifier.
    fn get_link(&self, id: LinkId) -> Result<Option<TicketLink>>;

    /// Delete a link. Returns `false` if it did not exist.
    fn delete_link(&self, id: LinkId) -> Result<bool>;

    /// List every link whose source ticket belongs to the project, in
    /// ascending identifier order.
    fn list_links(&self, project_id: ProjectId) -> Result<Vec<TicketLink>>;

    /// Delete every link that starts or ends at the ticket, returning the
    /// number removed.
    fn delete_links_for_ticket(&self, ticket_id: TicketId) -> Result<usize>;
}

/// Project membership collaborator.
///
/// Invoked by the surrounding service before any hierarchy or link
/// operation; the engine itself never re-checks access.
pub trait ProjectAccess: Send + Sync {
    /// Returns true if the user is a member (or owner) of the project.
    fn is_member(&self, project_id: ProjectId, user_id: UserId) -> Result<bool>;
}

/// Confirm membership, failing with [`TrackerError::AccessDenied`].
pub fn require_access<A: ProjectAccess + ?Sized>(
    access: &A,
    project_id: ProjectId,
    user_id: UserId,
) -> std::result::Result<(), TrackerError> {
    if access.is_member(project_id, user_id)? {
        Ok(())
    } else {
        Err(TrackerError::AccessDenied {
            project_id,
            user_id,
        })
    }
}
