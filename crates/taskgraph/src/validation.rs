//! Hierarchy validation for ticket create and update.
//!
//! Rules enforced for every parent reference:
//! - the parent exists and belongs to the same project
//! - the parent is not the ticket itself
//! - the parent's rank is strictly greater than the ticket's rank
//!
//! A subtask always needs a parent. Validation only reads through the
//! ticket store; nothing is written, so a failure leaves no partial state.

use crate::domain::{FieldUpdate, ProjectId, Ticket, TicketId, TicketType};
use crate::errors::{Result, TrackerError};
use crate::storage::TicketStore;
use crate::type_hierarchy::{self, can_parent};

/// Resolve a type label from a create request.
///
/// An empty label means "task"; anything else must be in the rank table.
pub fn resolve_type(label: &str) -> Result<TicketType> {
    if label.is_empty() {
        return Ok(TicketType::Task);
    }
    parse_type(label)
}

/// Parse a type label that must be recognized (empty is not accepted).
pub fn parse_type(label: &str) -> Result<TicketType> {
    type_hierarchy::lookup(label)
        .map(|(ticket_type, _)| ticket_type)
        .ok_or_else(|| TrackerError::InvalidType {
            found: label.to_string(),
            suggestion: type_hierarchy::suggest_type(label),
        })
}

/// Validate the type and parent of a ticket about to be created.
///
/// Returns the resolved type on success.
pub fn validate_for_create<S: TicketStore>(
    type_label: &str,
    parent_id: Option<TicketId>,
    project_id: ProjectId,
    tickets: &S,
) -> Result<TicketType> {
    let ticket_type = resolve_type(type_label)?;
    check_parent(ticket_type, parent_id, project_id, tickets)?;
    Ok(ticket_type)
}

/// Validate a partial update of type and/or parent.
///
/// Returns the effective type. When neither the type nor the parent is
/// mentioned, the stored state is accepted as-is without re-validation,
/// even if it would not pass today's rules.
pub fn validate_for_update<S: TicketStore>(
    current: &Ticket,
    requested_type: Option<&str>,
    requested_parent: FieldUpdate<TicketId>,
    tickets: &S,
) -> Result<TicketType> {
    if requested_type.is_none() && !requested_parent.is_mentioned() {
        return Ok(current.ticket_type);
    }

    let effective_type = match requested_type {
        Some(label) => parse_type(label)?,
        None => current.ticket_type,
    };
    let effective_parent = requested_parent.resolve(current.parent_id);

    if effective_parent == Some(current.id) {
        return Err(TrackerError::SelfParent { id: current.id });
    }

    check_parent(effective_type, effective_parent, current.project_id, tickets)?;

    if effective_type != current.ticket_type {
        check_children(current, effective_type, tickets)?;
    }

    Ok(effective_type)
}

fn check_parent<S: TicketStore>(
    ticket_type: TicketType,
    parent_id: Option<TicketId>,
    project_id: ProjectId,
    tickets: &S,
) -> Result<()> {
    let Some(parent_id) = parent_id else {
        if ticket_type == TicketType::Subtask {
            return Err(TrackerError::MissingParent);
        }
        return Ok(());
    };

    let parent = tickets
        .get_ticket(parent_id)?
        .ok_or(TrackerError::ParentNotFound { id: parent_id })?;

    if parent.project_id != project_id {
        return Err(TrackerError::CrossProjectParent {
            parent_id,
            parent_project: parent.project_id,
            project_id,
        });
    }

    if !can_parent(parent.ticket_type, ticket_type) {
        return Err(TrackerError::InvalidHierarchy {
            parent_type: parent.ticket_type,
            child_type: ticket_type,
        });
    }

    Ok(())
}

/// A type change must keep every existing child strictly below the ticket.
fn check_children<S: TicketStore>(
    current: &Ticket,
    new_type: TicketType,
    tickets: &S,
) -> Result<()> {
    let blocked_child = tickets
        .list_tickets(current.project_id)?
        .into_iter()
        .find(|t| t.parent_id == Some(current.id) && !can_parent(new_type, t.ticket_type));

    match blocked_child {
        Some(child) => Err(TrackerError::InvalidHierarchy {
            parent_type: new_type,
            child_type: child.ticket_type,
        }),
        None => Ok(()),
    }
}
