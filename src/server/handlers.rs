//! HTTP route handlers
//!
//! Handlers resolve path parameters to databases and stacks, call into the
//! [`Pila`](crate::pila::Pila) and translate the outcome:
//! a failed lookup is a 404, a created resource a 201, a removal a 204.

use axum::{
    body::Bytes,
    extract::{Extension, Json, Path, Query},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::metrics;
use crate::pila::{Database, DatabaseId, Stack, StackId, Value};
use crate::server::AppState;

// ===== Request/Response Types =====

/// Body of a push request.
#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub element: Value,
}

/// Body returned by push and pop.
#[derive(Debug, Serialize)]
pub struct ElementResponse {
    pub element: Value,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn find_database(state: &AppState, raw_id: &str) -> Result<Arc<Database>, Response> {
    raw_id
        .parse::<DatabaseId>()
        .ok()
        .and_then(|id| state.pila.get_database(id))
        .ok_or_else(|| {
            error_response(
                StatusCode::NOT_FOUND,
                format!("database {} is not found", raw_id),
            )
        })
}

fn find_stack(
    state: &AppState,
    raw_database_id: &str,
    raw_stack_id: &str,
) -> Result<(Arc<Database>, Arc<Stack>), Response> {
    let db = find_database(state, raw_database_id)?;
    let stack = raw_stack_id
        .parse::<StackId>()
        .ok()
        .and_then(|id| db.get_stack(id))
        .ok_or_else(|| {
            error_response(
                StatusCode::NOT_FOUND,
                format!("stack {} is not found", raw_stack_id),
            )
        })?;
    Ok((db, stack))
}

/// Wraps an already-serialized JSON payload.
fn json_bytes(payload: crate::error::Result<Vec<u8>>) -> Response {
    match payload {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Extracts a non-empty `name` query parameter, stored verbatim.
fn required_name(params: &HashMap<String, String>) -> Result<&str, Response> {
    match params.get("name").map(String::as_str) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing name query parameter",
        )),
    }
}

// ===== Status Handlers =====

/// GET /_status
#[instrument(skip(state))]
pub async fn status(Extension(state): Extension<Arc<AppState>>) -> Response {
    json_bytes(state.pila.status().to_json())
}

/// GET /_metrics
#[instrument(skip(state))]
pub async fn metrics_endpoint(Extension(state): Extension<Arc<AppState>>) -> Response {
    metrics::refresh(&state.pila.status());
    metrics::export_metrics().into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> Response {
    warn!(path = %uri.path(), "Resource not found");
    error_response(StatusCode::NOT_FOUND, "resource not found")
}

// ===== Database Handlers =====

/// List all databases
///
/// GET /databases
#[instrument(skip(state))]
pub async fn list_databases(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.pila.status()).into_response()
}

/// Create a new database
///
/// PUT /databases?name=NAME
#[instrument(skip(state))]
pub async fn create_database(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let name = match required_name(&params) {
        Ok(name) => name,
        Err(response) => {
            metrics::record_operation("create_database", false);
            return response;
        }
    };

    let id = state.pila.create_database(name);
    metrics::record_operation("create_database", true);
    info!(database = %id, name, "Database created");

    match state.pila.get_database(id) {
        Some(db) => (StatusCode::CREATED, Json(db.status())).into_response(),
        // removed concurrently between create and lookup
        None => error_response(StatusCode::NOT_FOUND, format!("database {} is not found", id)),
    }
}

/// Get database status
///
/// GET /databases/:database_id
#[instrument(skip(state))]
pub async fn get_database(
    Extension(state): Extension<Arc<AppState>>,
    Path(database_id): Path<String>,
) -> Response {
    match find_database(&state, &database_id) {
        Ok(db) => json_bytes(db.status().to_json()),
        Err(response) => response,
    }
}

/// Remove a database
///
/// DELETE /databases/:database_id
#[instrument(skip(state))]
pub async fn remove_database(
    Extension(state): Extension<Arc<AppState>>,
    Path(database_id): Path<String>,
) -> Response {
    let db = match find_database(&state, &database_id) {
        Ok(db) => db,
        Err(response) => {
            metrics::record_operation("remove_database", false);
            return response;
        }
    };

    if state.pila.remove_database(db.id()) {
        metrics::record_operation("remove_database", true);
        info!(database = %db.id(), "Database removed");
        StatusCode::NO_CONTENT.into_response()
    } else {
        metrics::record_operation("remove_database", false);
        error_response(
            StatusCode::NOT_FOUND,
            format!("database {} is not found", database_id),
        )
    }
}

// ===== Stack Handlers =====

/// List stacks in a database
///
/// GET /databases/:database_id/stacks
#[instrument(skip(state))]
pub async fn list_stacks(
    Extension(state): Extension<Arc<AppState>>,
    Path(database_id): Path<String>,
) -> Response {
    match find_database(&state, &database_id) {
        Ok(db) => Json(db.stacks_status()).into_response(),
        Err(response) => response,
    }
}

/// Create a stack in a database
///
/// PUT /databases/:database_id/stacks?name=NAME
#[instrument(skip(state))]
pub async fn create_stack(
    Extension(state): Extension<Arc<AppState>>,
    Path(database_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let db = match find_database(&state, &database_id) {
        Ok(db) => db,
        Err(response) => return response,
    };
    let name = match required_name(&params) {
        Ok(name) => name,
        Err(response) => {
            metrics::record_operation("create_stack", false);
            return response;
        }
    };

    let id = db.create_stack(name);
    metrics::record_operation("create_stack", true);
    info!(database = %db.id(), stack = %id, name, "Stack created");

    match db.get_stack(id) {
        Some(stack) => (StatusCode::CREATED, Json(stack.status())).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("stack {} is not found", id)),
    }
}

/// Get stack status
///
/// GET /databases/:database_id/stacks/:stack_id
#[instrument(skip(state))]
pub async fn get_stack(
    Extension(state): Extension<Arc<AppState>>,
    Path((database_id, stack_id)): Path<(String, String)>,
) -> Response {
    match find_stack(&state, &database_id, &stack_id) {
        Ok((_, stack)) => Json(stack.status()).into_response(),
        Err(response) => response,
    }
}

/// Push an element
///
/// POST /databases/:database_id/stacks/:stack_id
/// Body: {"element": VALUE}
#[instrument(skip(state, body))]
pub async fn push_stack(
    Extension(state): Extension<Arc<AppState>>,
    Path((database_id, stack_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let (_, stack) = match find_stack(&state, &database_id, &stack_id) {
        Ok(found) => found,
        Err(response) => return response,
    };

    let request: PushRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            metrics::record_operation("push", false);
            warn!(error = %e, "Malformed push body");
            return error_response(StatusCode::BAD_REQUEST, format!("invalid element: {}", e));
        }
    };

    stack.push(request.element.clone());
    metrics::record_operation("push", true);

    Json(ElementResponse {
        element: request.element,
    })
    .into_response()
}

/// Pop, flush or remove a stack
///
/// DELETE /databases/:database_id/stacks/:stack_id          - pop
/// DELETE /databases/:database_id/stacks/:stack_id?flush    - flush
/// DELETE /databases/:database_id/stacks/:stack_id?full     - remove
#[instrument(skip(state))]
pub async fn delete_stack(
    Extension(state): Extension<Arc<AppState>>,
    Path((database_id, stack_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (db, stack) = match find_stack(&state, &database_id, &stack_id) {
        Ok(found) => found,
        Err(response) => return response,
    };

    if params.contains_key("full") {
        let removed = db.remove_stack(stack.id());
        metrics::record_operation("remove_stack", removed);
        if !removed {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("stack {} is not found", stack_id),
            );
        }
        info!(database = %db.id(), stack = %stack.id(), "Stack removed");
        return StatusCode::NO_CONTENT.into_response();
    }

    if params.contains_key("flush") {
        stack.flush();
        metrics::record_operation("flush", true);
        return Json(stack.status()).into_response();
    }

    match stack.pop() {
        Some(element) => {
            metrics::record_operation("pop", true);
            Json(ElementResponse { element }).into_response()
        }
        None => {
            metrics::record_operation("pop", false);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
