//! Ticket hierarchy and dependency-link graph engine.
//!
//! This library enforces the epic > task > subtask parent structure over
//! tickets, keeps the explicit link graph of every project acyclic, and
//! projects tickets and links into a node/edge view for visualization.
//! Transport, authentication and SQL persistence live outside this crate and
//! are reached through the traits in [`storage`].

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod projection;
pub mod storage;
pub mod type_hierarchy;
pub mod validation;
pub mod visualization;

// Re-export commonly used types
pub use commands::CommandExecutor;
pub use config::TaskgraphConfig;
pub use domain::{
    CreateTicket, FieldUpdate, LinkId, ProjectId, Ticket, TicketId, TicketLink, TicketType,
    TicketUpdate, UserId,
};
pub use errors::TrackerError;
pub use projection::{GraphData, GraphEdge, GraphNode};
pub use storage::{InMemoryStorage, JsonFileStorage, LinkStore, ProjectAccess, TicketStore};
