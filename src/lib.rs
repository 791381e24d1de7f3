//! Library crate for ciceron-back, exposing the debate core, the REST layers and the
//! optional API client to binaries and integration tests.

/// Typed HTTP client and local debate history.
#[cfg(feature = "client")]
pub mod client;
/// Runtime configuration.
pub mod config;
/// Persistence: models, stores and the audio vault.
pub mod dao;
/// Request and response types.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum route trees.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Debate core and shared application state.
pub mod state;

use axum::{Router, http::HeaderValue};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

/// Build the top-level router and attach cross-cutting middleware layers.
pub fn build_router(state: state::SharedState) -> Router<()> {
    let cors = cors_layer(state.config().cors_origin.as_deref());
    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::permissive().allow_origin(value),
        Err(err) => {
            warn!(%origin, error = %err, "invalid CORS origin; allowing any origin");
            CorsLayer::permissive()
        }
    }
}
