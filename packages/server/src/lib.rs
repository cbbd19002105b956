//! HTTP API for the OrgTree hierarchy engine
//!
//! Exposes `TreeService` operations as JSON endpoints. All mutations are
//! serialized inside the service, so handlers only hold a shared reference.
//!
//! # Usage
//!
//! ```bash
//! ORGTREE_PORT=3001 RUST_LOG=debug cargo run --bin orgtree-server
//! ```

use axum::{
    http::{header, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use orgtree_core::TreeService;

mod http_error;
mod node_endpoints;

pub use http_error::HttpError;
pub use node_endpoints::ReparentInput;

/// Environment variable for the listening port
pub const PORT_ENV: &str = "ORGTREE_PORT";

/// Port used when `ORGTREE_PORT` is unset or unparsable
pub const DEFAULT_PORT: u16 = 3001;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub tree_service: Arc<TreeService>,
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(node_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// CORS layer allowing `CORS_ALLOW_ORIGIN`, or any origin when unset
fn cors_layer() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false);

    match std::env::var("CORS_ALLOW_ORIGIN")
        .ok()
        .and_then(|origin| origin.parse::<header::HeaderValue>().ok())
    {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Port from `ORGTREE_PORT`, falling back to 3001
pub fn port_from_env() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns error if server fails to bind or start.
pub async fn start_server(tree_service: Arc<TreeService>, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState { tree_service });

    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("OrgTree server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
