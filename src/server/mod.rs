//! piladb HTTP server
//!
//! axum-based routing layer over the in-memory [`Pila`].

pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;

use axum::{extract::DefaultBodyLimit, extract::Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{error, info};

use crate::pila::Pila;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: String,
    /// HTTP port
    pub http_port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1".to_string(),
            http_port: 1205,
            enable_cors: false,
            max_body_size: 10 * 1024 * 1024, // 10MB
            timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_addr, self.http_port)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pila: Arc<Pila>,
    pub config: ServerConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("databases", &self.pila.number_of_databases())
            .finish()
    }
}

impl AppState {
    pub fn new(pila: Arc<Pila>, config: ServerConfig) -> Self {
        Self { pila, config }
    }
}

/// Builds the full router for the given state.
pub fn router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;
    let timeout = Duration::from_secs(state.config.timeout_secs);
    let enable_cors = state.config.enable_cors;

    metrics::init_metrics();

    let app = Router::new()
        .merge(routes::status_routes())
        .merge(routes::database_routes())
        .merge(routes::stack_routes())
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(Extension(Arc::new(state)))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Start the piladb server and serve until Ctrl-C.
pub async fn start_server(config: ServerConfig, pila: Arc<Pila>) -> anyhow::Result<()> {
    info!(
        addr = %config.http_addr,
        port = config.http_port,
        "Starting piladb HTTP server"
    );

    let addr = config.bind_addr();
    let app = router(AppState::new(pila, config));
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Status: http://{}/_status", addr);
    info!("Metrics: http://{}/_metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            anyhow::anyhow!("Server failed: {}", e)
        })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
