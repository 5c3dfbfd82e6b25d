//! HTTP routes definition

use axum::{routing::get, Router};

use super::handlers;

/// Status and monitoring routes
///
/// - GET /_status  - Pila status
/// - GET /_metrics - Prometheus metrics
pub fn status_routes() -> Router {
    Router::new()
        .route("/_status", get(handlers::status))
        .route("/_metrics", get(handlers::metrics_endpoint))
}

/// Database routes
///
/// - GET    /databases              - List all databases
/// - PUT    /databases?name=NAME    - Create a database
/// - GET    /databases/:database_id - Get database status
/// - DELETE /databases/:database_id - Remove a database
pub fn database_routes() -> Router {
    Router::new()
        .route(
            "/databases",
            get(handlers::list_databases).put(handlers::create_database),
        )
        .route(
            "/databases/:database_id",
            get(handlers::get_database).delete(handlers::remove_database),
        )
}

/// Stack routes (scoped to a database)
///
/// - GET    /databases/:db/stacks              - List stacks
/// - PUT    /databases/:db/stacks?name=NAME    - Create a stack
/// - GET    /databases/:db/stacks/:stack       - Stack status
/// - POST   /databases/:db/stacks/:stack       - Push `{"element": value}`
/// - DELETE /databases/:db/stacks/:stack       - Pop
/// - DELETE /databases/:db/stacks/:stack?flush - Empty the stack
/// - DELETE /databases/:db/stacks/:stack?full  - Remove the stack
pub fn stack_routes() -> Router {
    Router::new()
        .route(
            "/databases/:database_id/stacks",
            get(handlers::list_stacks).put(handlers::create_stack),
        )
        .route(
            "/databases/:database_id/stacks/:stack_id",
            get(handlers::get_stack)
                .post(handlers::push_stack)
                .delete(handlers::delete_stack),
        )
}
