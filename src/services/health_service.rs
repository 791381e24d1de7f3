use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` when storage answers its health check, `degraded` otherwise.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let live_sessions = state.live_sessions().len();
    let Some(store) = state.debate_store().await else {
        warn!("storage unavailable (degraded mode)");
        return HealthResponse::degraded(live_sessions);
    };

    match store.health_check().await {
        Ok(()) => HealthResponse::ok(live_sessions),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(live_sessions)
        }
    }
}
