//! Engine operations exposed to the surrounding service.
//!
//! The `CommandExecutor` handles all business logic for ticket management,
//! link manipulation and graph projection. Callers are expected to have run
//! [`crate::storage::require_access`] for the project beforehand.
//!
//! This module is organized into submodules by functional area:
//! - `ticket`: hierarchy-aware ticket create/update/delete
//! - `link`: acyclic link insertion and removal
//! - `graph`: graph projection and export

mod graph;
mod link;
mod ticket;

// Common imports used across modules
use crate::config::TaskgraphConfig;
use crate::domain::{ProjectId, Ticket, TicketId};
use crate::errors::{Result, TrackerError};
use crate::storage::{LinkStore, ProjectLocks, TicketStore};
use std::sync::{Arc, Mutex};

/// Executes engine operations with validation and per-project serialization.
///
/// Generic over the storage backend so the same rules run against the
/// in-memory store, the JSON store or an external database adapter.
pub struct CommandExecutor<S: TicketStore + LinkStore> {
    storage: S,
    config: TaskgraphConfig,
    locks: ProjectLocks,
}

impl<S: TicketStore + LinkStore> CommandExecutor<S> {
    /// Create a new command executor with the given storage
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, TaskgraphConfig::default())
    }

    /// Create a command executor with explicit configuration
    pub fn with_config(storage: S, config: TaskgraphConfig) -> Self {
        Self {
            storage,
            config,
            locks: ProjectLocks::new(),
        }
    }

    /// Get reference to the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get reference to the active configuration
    pub fn config(&self) -> &TaskgraphConfig {
        &self.config
    }

    fn project_lock(&self, project_id: ProjectId) -> Arc<Mutex<()>> {
        self.locks.for_project(project_id)
    }

    fn load_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.storage
            .get_ticket(id)?
            .ok_or(TrackerError::TicketNotFound { id })
    }
}
