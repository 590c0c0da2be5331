pub mod response;

use crate::config::Config;
use crate::features;
use crate::identity::IdentityProvider;
use crate::middleware;
use crate::session::{self, InactivityMonitor, SessionMemory};
use crate::store::DocumentStore;
use crate::web;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;

/// Backends and shared services handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub activity: InactivityMonitor,
    /// Backing store of the per-browser sessions
    pub sessions: SessionMemory,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        inactivity_timeout: Duration,
    ) -> Self {
        Self {
            store,
            identity,
            activity: InactivityMonitor::new(inactivity_timeout),
            sessions: SessionMemory::new(),
        }
    }
}

/// Build the application: HTML pages, the JSON API under `/api/v1`, and
/// `/health`, wrapped in the session, compression, tracing and CORS layers.
pub fn create_router(state: AppState, config: &Config) -> Router {
    let sessions = session::session_layer(&config.session, state.sessions.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", features::router(state.clone()))
        .merge(web::router(state.clone()))
        .with_state(state)
        .layer(sessions)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "store": "connected",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Document store health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}
