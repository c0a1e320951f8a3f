//! Ticket CRUD operations with hierarchy enforcement

use super::*;
use crate::domain::{CreateTicket, NewTicket, TicketUpdate, UserId};
use crate::validation;
use chrono::Utc;
use tracing::info;

impl<S: TicketStore + LinkStore> CommandExecutor<S> {
    /// Create a ticket after validating its type and parent.
    ///
    /// The caller becomes the reporter and the status starts at the
    /// configured default.
    pub fn create_ticket(
        &self,
        project_id: ProjectId,
        caller: UserId,
        request: CreateTicket,
    ) -> Result<Ticket> {
        let lock = self.project_lock(project_id);
        let _guard = ProjectLocks::acquire(&lock);

        let ticket_type = validation::validate_for_create(
            &request.ticket_type,
            request.parent_id,
            project_id,
            &self.storage,
        )?;

        let ticket = self.storage.insert_ticket(NewTicket {
            title: request.title,
            description: request.description,
            status: self.config.default_status(),
            priority: request.priority,
            ticket_type,
            parent_id: request.parent_id,
            project_id,
            reporter_id: caller,
            assignee_id: request.assignee_id,
        })?;

        info!(
            project_id,
            ticket_id = ticket.id,
            caller,
            ticket_type = %ticket.ticket_type,
            parent_id = ?ticket.parent_id,
            "Created ticket"
        );
        Ok(ticket)
    }

    pub fn get_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.load_ticket(id)
    }

    pub fn list_tickets(&self, project_id: ProjectId) -> Result<Vec<Ticket>> {
        Ok(self.storage.list_tickets(project_id)?)
    }

    /// Apply a partial update.
    ///
    /// Type and parent are re-validated only if the update mentions either
    /// of them. Status is a free-form label and is stored as given.
    pub fn update_ticket(
        &self,
        id: TicketId,
        caller: UserId,
        update: TicketUpdate,
    ) -> Result<Ticket> {
        let project_id = self.load_ticket(id)?.project_id;
        let lock = self.project_lock(project_id);
        let _guard = ProjectLocks::acquire(&lock);

        // Re-read under the lock; the first read only located the project
        let mut ticket = self.load_ticket(id)?;

        ticket.ticket_type = validation::validate_for_update(
            &ticket,
            update.ticket_type.as_deref(),
            update.parent_id,
            &self.storage,
        )?;
        ticket.parent_id = update.parent_id.resolve(ticket.parent_id);
        ticket.assignee_id = update.assignee_id.resolve(ticket.assignee_id);

        if let Some(title) = update.title {
            ticket.title = title;
        }
        if let Some(description) = update.description {
            ticket.description = description;
        }
        if let Some(status) = update.status {
            ticket.status = status;
        }
        if let Some(priority) = update.priority {
            ticket.priority = priority;
        }
        ticket.updated_at = Utc::now();

        self.storage.update_ticket(&ticket)?;

        info!(project_id, ticket_id = id, caller, "Updated ticket");
        Ok(ticket)
    }

    /// Delete a ticket.
    ///
    /// Fails with `HasChildren` while other tickets name it as parent. Links
    /// touching the ticket are removed first, then the ticket itself. If the
    /// final delete fails the ticket remains, without its links.
    pub fn delete_ticket(&self, id: TicketId, caller: UserId) -> Result<()> {
        let project_id = self.load_ticket(id)?.project_id;
        let lock = self.project_lock(project_id);
        let _guard = ProjectLocks::acquire(&lock);

        let children = self
            .storage
            .list_tickets(project_id)?
            .iter()
            .filter(|t| t.parent_id == Some(id))
            .count();
        if children > 0 {
            return Err(TrackerError::HasChildren { id, children });
        }

        let removed_links = self.storage.delete_links_for_ticket(id)?;
        if !self.storage.delete_ticket(id)? {
            return Err(TrackerError::TicketNotFound { id });
        }

        info!(project_id, ticket_id = id, caller, removed_links, "Deleted ticket");
        Ok(())
    }
}
