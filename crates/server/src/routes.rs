//! API route definitions

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use taskgraph::commands::CommandExecutor;
use taskgraph::domain::{
    CreateTicket, LinkId, ProjectId, Ticket, TicketId, TicketLink, TicketUpdate, UserId,
};
use taskgraph::errors::TrackerError;
use taskgraph::projection::GraphData;
use taskgraph::storage::{require_access, LinkStore, ProjectAccess, TicketStore};

/// Header carrying the authenticated caller's user identifier
pub const USER_HEADER: &str = "x-user-id";

/// Shared application state
pub type AppState<S> = Arc<CommandExecutor<S>>;

/// Create API routes
pub fn create_routes<S>(executor: Arc<CommandExecutor<S>>) -> Router
where
    S: TicketStore + LinkStore + ProjectAccess + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/projects/:project_id/tickets",
            get(list_tickets::<S>).post(create_ticket::<S>),
        )
        .route(
            "/tickets/:id",
            get(get_ticket::<S>)
                .patch(update_ticket::<S>)
                .delete(delete_ticket::<S>),
        )
        .route(
            "/projects/:project_id/links",
            get(list_links::<S>).post(add_link::<S>),
        )
        .route("/links/:id", delete(remove_link::<S>))
        .route("/projects/:project_id/graph", get(get_graph::<S>))
        .route("/projects/:project_id/graph/export", get(export_graph::<S>))
        .with_state(executor)
}

/// Authenticated caller, taken from the `x-user-id` header.
///
/// Token verification happens upstream; this only parses the identity the
/// gateway forwarded.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

#[async_trait]
impl<St: Send + Sync> FromRequestParts<St> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .map(Caller)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// Failure of an API call
#[derive(Debug)]
pub enum ApiError {
    Tracker(TrackerError),
    Unauthenticated,
    UnsupportedFormat(String),
    /// Request body missing, not JSON, or not the expected shape
    InvalidBody(JsonRejection),
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        ApiError::Tracker(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection)
    }
}

/// HTTP status for an engine error
pub fn status_for(err: &TrackerError) -> StatusCode {
    match err {
        TrackerError::TicketNotFound { .. } | TrackerError::LinkNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TrackerError::CycleDetected { .. } | TrackerError::HasChildren { .. } => {
            StatusCode::CONFLICT
        }
        TrackerError::AccessDenied { .. } => StatusCode::FORBIDDEN,
        TrackerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, kind) = match self {
            ApiError::Tracker(err) => {
                let status = status_for(&err);
                let message = if let TrackerError::Storage(_) = err {
                    tracing::error!("Storage failure: {}", err);
                    "internal storage error".to_string()
                } else {
                    err.to_string()
                };
                (status, message, err.kind())
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                format!("missing or invalid {} header", USER_HEADER),
                "unauthenticated",
            ),
            ApiError::UnsupportedFormat(format) => (
                StatusCode::BAD_REQUEST,
                format!("unsupported export format '{}'", format),
                "unsupported_format",
            ),
            ApiError::InvalidBody(rejection) => {
                (rejection.status(), rejection.body_text(), "invalid_body")
            }
        };

        let body = ErrorBody {
            error,
            kind: kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "taskgraph-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn check_access<S>(
    executor: &CommandExecutor<S>,
    project_id: ProjectId,
    caller: Caller,
) -> ApiResult<()>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    require_access(executor.storage(), project_id, caller.0)?;
    Ok(())
}

/// Load a ticket and confirm the caller may see its project
fn accessible_ticket<S>(
    executor: &CommandExecutor<S>,
    id: TicketId,
    caller: Caller,
) -> ApiResult<Ticket>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    let ticket = executor.get_ticket(id)?;
    check_access(executor, ticket.project_id, caller)?;
    Ok(ticket)
}

async fn list_tickets<S>(
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    State(executor): State<AppState<S>>,
) -> ApiResult<Json<Vec<Ticket>>>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    check_access(&executor, project_id, caller)?;
    Ok(Json(executor.list_tickets(project_id)?))
}

async fn create_ticket<S>(
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    State(executor): State<AppState<S>>,
    body: Result<Json<CreateTicket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Ticket>)>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    check_access(&executor, project_id, caller)?;
    let Json(request) = body?;
    let ticket = executor.create_ticket(project_id, caller.0, request)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_ticket<S>(
    caller: Caller,
    Path(id): Path<TicketId>,
    State(executor): State<AppState<S>>,
) -> ApiResult<Json<Ticket>>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    Ok(Json(accessible_ticket(&executor, id, caller)?))
}

async fn update_ticket<S>(
    caller: Caller,
    Path(id): Path<TicketId>,
    State(executor): State<AppState<S>>,
    body: Result<Json<TicketUpdate>, JsonRejection>,
) -> ApiResult<Json<Ticket>>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    accessible_ticket(&executor, id, caller)?;
    let Json(update) = body?;
    Ok(Json(executor.update_ticket(id, caller.0, update)?))
}

async fn delete_ticket<S>(
    caller: Caller,
    Path(id): Path<TicketId>,
    State(executor): State<AppState<S>>,
) -> ApiResult<StatusCode>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    accessible_ticket(&executor, id, caller)?;
    executor.delete_ticket(id, caller.0)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body of a link creation request
#[derive(Debug, Serialize, Deserialize)]
pub struct AddLinkRequest {
    pub source_id: TicketId,
    pub target_id: TicketId,
    #[serde(default = "default_link_type")]
    pub link_type: String,
}

fn default_link_type() -> String {
    "blocks".to_string()
}

async fn list_links<S>(
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    State(executor): State<AppState<S>>,
) -> ApiResult<Json<Vec<TicketLink>>>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    check_access(&executor, project_id, caller)?;
    Ok(Json(executor.list_links(project_id)?))
}

async fn add_link<S>(
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    State(executor): State<AppState<S>>,
    body: Result<Json<AddLinkRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketLink>)>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    check_access(&executor, project_id, caller)?;
    let Json(request) = body?;
    let link = executor.add_link(
        project_id,
        request.source_id,
        request.target_id,
        &request.link_type,
        caller.0,
    )?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn remove_link<S>(
    caller: Caller,
    Path(id): Path<LinkId>,
    State(executor): State<AppState<S>>,
) -> ApiResult<StatusCode>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    let project_id = executor.link_project(id)?;
    check_access(&executor, project_id, caller)?;
    executor.remove_link(id, caller.0)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the node/edge projection of a project
async fn get_graph<S>(
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    State(executor): State<AppState<S>>,
) -> ApiResult<Json<GraphData>>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    check_access(&executor, project_id, caller)?;
    Ok(Json(executor.build_graph(project_id)?))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "dot".to_string()
}

async fn export_graph<S>(
    caller: Caller,
    Path(project_id): Path<ProjectId>,
    Query(params): Query<ExportQuery>,
    State(executor): State<AppState<S>>,
) -> ApiResult<Response>
where
    S: TicketStore + LinkStore + ProjectAccess,
{
    check_access(&executor, project_id, caller)?;
    let rendered = executor
        .export_graph(project_id, &params.format)?
        .ok_or(ApiError::UnsupportedFormat(params.format))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], rendered).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use serde_json::json;
    use taskgraph::storage::InMemoryStorage;

    const USER: i64 = 1;

    fn user_header() -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(USER_HEADER),
            HeaderValue::from_static("1"),
        )
    }

    fn create_test_app() -> TestServer {
        let storage = InMemoryStorage::new();
        storage.grant_access(1, USER);
        let executor = Arc::new(CommandExecutor::new(storage));
        TestServer::new(create_routes(executor)).unwrap()
    }

    async fn post_ticket(server: &TestServer, body: serde_json::Value) -> Ticket {
        let (name, value) = user_header();
        let response = server
            .post("/projects/1/tickets")
            .add_header(name, value)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = create_test_app();
        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({
            "status": "ok",
            "service": "taskgraph-api",
            "version": env!("CARGO_PKG_VERSION")
        }));
    }

    #[tokio::test]
    async fn test_missing_caller_is_unauthorized() {
        let server = create_test_app();
        let response = server.get("/projects/1/tickets").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "unauthenticated");
    }

    #[tokio::test]
    async fn test_non_member_is_forbidden() {
        let server = create_test_app();
        let (name, value) = user_header();
        let response = server.get("/projects/2/tickets").add_header(name, value).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "access_denied");
    }

    #[tokio::test]
    async fn test_create_and_list_tickets() {
        let server = create_test_app();
        let epic = post_ticket(&server, json!({"title": "Epic", "type": "epic"})).await;
        let task = post_ticket(
            &server,
            json!({"title": "Task", "type": "task", "parent_id": epic.id}),
        )
        .await;
        assert_eq!(task.parent_id, Some(epic.id));
        assert_eq!(task.reporter_id, USER);

        let (name, value) = user_header();
        let response = server.get("/projects/1/tickets").add_header(name, value).await;
        response.assert_status_ok();
        let tickets: Vec<Ticket> = response.json();
        assert_eq!(tickets.len(), 2);
    }

    #[tokio::test]
    async fn test_validation_error_mapping() {
        let server = create_test_app();
        let (name, value) = user_header();
        let response = server
            .post("/projects/1/tickets")
            .add_header(name, value)
            .json(&json!({"title": "Orphan", "type": "subtask"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "missing_parent");
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_error_shape() {
        let server = create_test_app();
        let (name, value) = user_header();

        // Valid JSON, missing the required title
        let response = server
            .post("/projects/1/tickets")
            .add_header(name.clone(), value.clone())
            .json(&json!({"type": "task"}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "invalid_body");

        // Not JSON at all
        let response = server
            .post("/projects/1/links")
            .add_header(name.clone(), value.clone())
            .bytes(Bytes::from_static(b"{ not json"))
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "invalid_body");

        // Wrong content type
        let ticket = post_ticket(&server, json!({"title": "Target"})).await;
        let response = server
            .patch(&format!("/tickets/{}", ticket.id))
            .add_header(name, value)
            .text("title=x")
            .await;
        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "invalid_body");
    }

    #[tokio::test]
    async fn test_get_ticket_not_found() {
        let server = create_test_app();
        let (name, value) = user_header();
        let response = server.get("/tickets/999").add_header(name, value).await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_patch_clears_parent() {
        let server = create_test_app();
        let epic = post_ticket(&server, json!({"title": "Epic", "type": "epic"})).await;
        let task = post_ticket(&server, json!({"title": "Task", "parent_id": epic.id})).await;

        let (name, value) = user_header();
        let response = server
            .patch(&format!("/tickets/{}", task.id))
            .add_header(name, value)
            .json(&json!({"parent_id": null, "status": "in review"}))
            .await;
        response.assert_status_ok();
        let updated: Ticket = response.json();
        assert_eq!(updated.parent_id, None);
        assert_eq!(updated.status, "in review");
    }

    #[tokio::test]
    async fn test_cycle_is_conflict() {
        let server = create_test_app();
        let a = post_ticket(&server, json!({"title": "A"})).await;
        let b = post_ticket(&server, json!({"title": "B"})).await;

        let (name, value) = user_header();
        server
            .post("/projects/1/links")
            .add_header(name.clone(), value.clone())
            .json(&json!({"source_id": a.id, "target_id": b.id}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/projects/1/links")
            .add_header(name, value)
            .json(&json!({"source_id": b.id, "target_id": a.id, "link_type": "blocks"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorBody = response.json();
        assert_eq!(body.kind, "cycle_detected");
    }

    #[tokio::test]
    async fn test_delete_parent_is_conflict() {
        let server = create_test_app();
        let epic = post_ticket(&server, json!({"title": "Epic", "type": "epic"})).await;
        post_ticket(&server, json!({"title": "Task", "parent_id": epic.id})).await;

        let (name, value) = user_header();
        let response = server
            .delete(&format!("/tickets/{}", epic.id))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_remove_link_and_graph() {
        let server = create_test_app();
        let epic = post_ticket(&server, json!({"title": "Epic", "type": "epic"})).await;
        let a = post_ticket(&server, json!({"title": "A", "parent_id": epic.id})).await;
        let b = post_ticket(&server, json!({"title": "B"})).await;

        let (name, value) = user_header();
        let link: TicketLink = server
            .post("/projects/1/links")
            .add_header(name.clone(), value.clone())
            .json(&json!({"source_id": a.id, "target_id": b.id}))
            .await
            .json();

        let graph: GraphData = server
            .get("/projects/1/graph")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);

        server
            .delete(&format!("/links/{}", link.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/links/{}", link.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_not_found();

        let graph: GraphData = server
            .get("/projects/1/graph")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.edges[0].is_hierarchy());
    }

    #[tokio::test]
    async fn test_export_formats() {
        let server = create_test_app();
        post_ticket(&server, json!({"title": "Only"})).await;

        let (name, value) = user_header();
        let response = server
            .get("/projects/1/graph/export?format=mermaid")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        assert!(response.text().starts_with("graph TD"));

        let response = server
            .get("/projects/1/graph/export")
            .add_header(name.clone(), value.clone())
            .await;
        assert!(response.text().contains("digraph tickets"));

        let response = server
            .get("/projects/1/graph/export?format=png")
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&TrackerError::SelfLink { id: 1 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&TrackerError::ParentNotFound { id: 1 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&TrackerError::Storage(anyhow::anyhow!("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
