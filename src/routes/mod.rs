use axum::Router;

use crate::{error::AppError, state::SharedState};

/// Debate CRUD, status and results.
pub mod debates;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Evaluation routes.
pub mod evaluations;
/// Health endpoint.
pub mod health;
/// Live session control and its event stream.
pub mod live;
/// Recording upload, metadata and audio download.
pub mod recordings;
/// Rubric lookup and scoring.
pub mod rubrics;

/// Base path of every REST route.
pub const API_PREFIX: &str = "/api";

/// Compose all route trees under [`API_PREFIX`], wiring in shared state and documentation.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(debates::router())
        .merge(recordings::router(state.config().max_file_size))
        .merge(evaluations::router())
        .merge(rubrics::router())
        .merge(live::router());

    Router::new()
        .nest(API_PREFIX, api_router)
        .merge(docs::router())
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::route_not_found()
}
