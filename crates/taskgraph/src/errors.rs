//! Typed errors returned by the engine.
//!
//! Every rejected operation maps to exactly one variant so callers can
//! translate failures into transport responses without parsing messages.
//! Collaborator failures arrive as `anyhow::Error` and are passed through
//! unchanged in [`TrackerError::Storage`].

use crate::domain::{LinkId, ProjectId, TicketId, TicketType, UserId};
use thiserror::Error;

/// Errors produced by hierarchy validation, link management and lookups
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid ticket type '{found}'{}", suggestion_hint(.suggestion))]
    InvalidType {
        found: String,
        suggestion: Option<&'static str>,
    },

    #[error("a {parent_type} cannot be the parent of a {child_type}")]
    InvalidHierarchy {
        parent_type: TicketType,
        child_type: TicketType,
    },

    #[error("a subtask must have a parent ticket")]
    MissingParent,

    #[error("ticket {id} cannot be its own parent")]
    SelfParent { id: TicketId },

    #[error("parent ticket {id} not found")]
    ParentNotFound { id: TicketId },

    #[error("parent ticket {parent_id} belongs to project {parent_project}, not {project_id}")]
    CrossProjectParent {
        parent_id: TicketId,
        parent_project: ProjectId,
        project_id: ProjectId,
    },

    #[error("ticket {id} cannot link to itself")]
    SelfLink { id: TicketId },

    #[error("tickets {source_id} and {target_id} are not both in project {project_id}")]
    CrossProjectLink {
        source_id: TicketId,
        target_id: TicketId,
        project_id: ProjectId,
    },

    #[error("link {source_id} -> {target_id} would close a cycle ({})", format_path(.path))]
    CycleDetected {
        source_id: TicketId,
        target_id: TicketId,
        /// Existing path from target back to source
        path: Vec<TicketId>,
    },

    #[error("link {id} not found")]
    LinkNotFound { id: LinkId },

    #[error("ticket {id} not found")]
    TicketNotFound { id: TicketId },

    #[error("ticket {id} still has {children} child ticket(s)")]
    HasChildren { id: TicketId, children: usize },

    #[error("user {user_id} has no access to project {project_id}")]
    AccessDenied {
        project_id: ProjectId,
        user_id: UserId,
    },

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl TrackerError {
    /// Stable machine-readable code for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::InvalidType { .. } => "invalid_type",
            TrackerError::InvalidHierarchy { .. } => "invalid_hierarchy",
            TrackerError::MissingParent => "missing_parent",
            TrackerError::SelfParent { .. } => "self_parent",
            TrackerError::ParentNotFound { .. } => "parent_not_found",
            TrackerError::CrossProjectParent { .. } => "cross_project_parent",
            TrackerError::SelfLink { .. } => "self_link",
            TrackerError::CrossProjectLink { .. } => "cross_project_link",
            TrackerError::CycleDetected { .. } => "cycle_detected",
            TrackerError::LinkNotFound { .. } => "link_not_found",
            TrackerError::TicketNotFound { .. } => "ticket_not_found",
            TrackerError::HasChildren { .. } => "has_children",
            TrackerError::AccessDenied { .. } => "access_denied",
            TrackerError::Storage(_) => "storage_error",
        }
    }

    /// Returns true for errors raised by parent/child rule checks.
    pub fn is_hierarchy_error(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidType { .. }
                | TrackerError::InvalidHierarchy { .. }
                | TrackerError::MissingParent
                | TrackerError::SelfParent { .. }
                | TrackerError::ParentNotFound { .. }
                | TrackerError::CrossProjectParent { .. }
        )
    }

    /// Returns true for errors raised by link checks.
    pub fn is_link_error(&self) -> bool {
        matches!(
            self,
            TrackerError::SelfLink { .. }
                | TrackerError::CrossProjectLink { .. }
                | TrackerError::CycleDetected { .. }
                | TrackerError::LinkNotFound { .. }
        )
    }
}

fn suggestion_hint(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => " (expected epic, task or subtask)".to_string(),
    }
}

fn format_path(path: &[TicketId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_type_message_includes_suggestion() {
        let err = TrackerError::InvalidType {
            found: "taks".to_string(),
            suggestion: Some("task"),
        };
        assert_eq!(
            err.to_string(),
            "invalid ticket type 'taks' (did you mean 'task'?)"
        );

        let err = TrackerError::InvalidType {
            found: "bug".to_string(),
            suggestion: None,
        };
        assert!(err.to_string().contains("expected epic, task or subtask"));
    }

    #[test]
    fn test_cycle_message_renders_path() {
        let err = TrackerError::CycleDetected {
            source_id: 3,
            target_id: 1,
            path: vec![1, 2, 3],
        };
        assert_eq!(
            err.to_string(),
            "link 3 -> 1 would close a cycle (1 -> 2 -> 3)"
        );
    }

    #[test]
    fn test_kinds_are_distinct_and_classified() {
        let errors = vec![
            TrackerError::MissingParent,
            TrackerError::SelfParent { id: 1 },
            TrackerError::SelfLink { id: 1 },
            TrackerError::LinkNotFound { id: 9 },
            TrackerError::TicketNotFound { id: 9 },
            TrackerError::Storage(anyhow::anyhow!("disk full")),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());

        assert!(errors[0].is_hierarchy_error());
        assert!(errors[2].is_link_error());
        assert!(!errors[4].is_hierarchy_error() && !errors[4].is_link_error());
    }

    #[test]
    fn test_storage_error_passes_through_context() {
        let inner = anyhow::anyhow!("connection reset").context("Failed to list links");
        let err: TrackerError = inner.into();
        assert_eq!(err.kind(), "storage_error");
        assert!(err.to_string().contains("connection reset"));
    }
}
