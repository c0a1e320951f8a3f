//! Core domain types for the ticket engine.
//!
//! Tickets and links refer to each other by plain identifiers that are
//! resolved through the storage collaborators, never by direct references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a ticket, assigned by the ticket store
pub type TicketId = i64;
/// Identifier of a project
pub type ProjectId = i64;
/// Identifier of a user (reporter, assignee, caller)
pub type UserId = i64;
/// Identifier of an explicit ticket link, assigned by the link store
pub type LinkId = i64;

/// Ticket type, ordered by hierarchy rank (see [`crate::type_hierarchy`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    /// Top-level grouping of work (rank 3)
    Epic,
    /// Ordinary unit of work (rank 2, the default)
    #[default]
    Task,
    /// Piece of a larger ticket; always has a parent (rank 1)
    Subtask,
}

impl TicketType {
    /// The label this type is stored and rendered as.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Epic => "epic",
            TicketType::Task => "task",
            TicketType::Subtask => "subtask",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket representing a unit of work inside one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    /// Free-form workflow label; no transitions are enforced
    pub status: String,
    /// Free-form priority label
    pub priority: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Parent ticket, always in the same project and of strictly higher rank
    pub parent_id: Option<TicketId>,
    pub project_id: ProjectId,
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ticket that has passed validation but has not been stored yet.
///
/// The store assigns the identifier and timestamps on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub ticket_type: TicketType,
    pub parent_id: Option<TicketId>,
    pub project_id: ProjectId,
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
}

/// An explicit directed link between two tickets of the same project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLink {
    pub id: LinkId,
    pub source_id: TicketId,
    pub target_id: TicketId,
    /// Free-text relation label, e.g. "blocks" or "relates"
    pub link_type: String,
    pub created_at: DateTime<Utc>,
}

/// A link that has passed the cycle check but has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub source_id: TicketId,
    pub target_id: TicketId,
    pub link_type: String,
}

/// Three-valued instruction for a nullable field in a partial update.
///
/// `Unchanged` and `Set(current value)` are distinct on purpose: hierarchy
/// re-validation runs whenever the parent is mentioned at all.
///
/// When deserialized inside a struct field marked `#[serde(default)]`, an
/// absent key is `Unchanged`, `null` is `Clear` and a value is `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Field not mentioned; keep the stored value
    Unchanged,
    /// Field explicitly cleared
    Clear,
    /// Field set to a new value
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unchanged
    }
}

impl<T> FieldUpdate<T> {
    /// Returns true if the update mentions the field at all.
    pub fn is_mentioned(&self) -> bool {
        !matches!(self, FieldUpdate::Unchanged)
    }

    /// Resolve the update against the currently stored value.
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Unchanged => current,
            FieldUpdate::Clear => None,
            FieldUpdate::Set(value) => Some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Clear,
        })
    }
}

/// Request to create a ticket in a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    /// Type label; empty means "task"
    #[serde(default, rename = "type")]
    pub ticket_type: String,
    #[serde(default)]
    pub parent_id: Option<TicketId>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
}

/// Partial update of a ticket.
///
/// Plain `Option` fields are overwritten when present. Parent and assignee
/// use [`FieldUpdate`] so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, rename = "type")]
    pub ticket_type: Option<String>,
    #[serde(default)]
    pub parent_id: FieldUpdate<TicketId>,
    #[serde(default)]
    pub assignee_id: FieldUpdate<UserId>,
}
