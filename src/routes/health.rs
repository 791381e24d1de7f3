use axum::{Router, extract::State, routing::get};

use crate::{
    dto::{
        envelope::{ApiResponse, ok},
        health::HealthResponse,
    },
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service status, `degraded` without storage", body = HealthResponse))
)]
/// Report liveness and whether storage is reachable.
pub async fn healthcheck(State(state): State<SharedState>) -> axum::Json<ApiResponse<HealthResponse>> {
    ok(health_service::health_status(&state).await)
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/health", get(healthcheck))
}
