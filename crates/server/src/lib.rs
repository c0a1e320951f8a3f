//! Taskgraph REST API Server Library
//!
//! Thin HTTP adapter over the taskgraph engine: resolves the caller,
//! checks project membership and translates engine errors into responses.

pub mod routes;

use axum::Router;
use std::sync::Arc;
use taskgraph::commands::CommandExecutor;
use taskgraph::storage::{LinkStore, ProjectAccess, TicketStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// Re-export for convenience
pub use routes::create_routes;

/// Full application: API routes under `/api` with CORS and request tracing
pub fn app<S>(executor: Arc<CommandExecutor<S>>) -> Router
where
    S: TicketStore + LinkStore + ProjectAccess + 'static,
{
    // Permissive CORS for local web UIs
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_routes(executor))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
