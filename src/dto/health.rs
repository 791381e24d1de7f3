//! Health check payload.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payload of `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of live sessions currently hosted.
    pub live_sessions: usize,
}

impl HealthResponse {
    /// Storage is reachable.
    pub fn ok(live_sessions: usize) -> Self {
        Self {
            status: "ok".into(),
            live_sessions,
        }
    }

    /// Running without storage.
    pub fn degraded(live_sessions: usize) -> Self {
        Self {
            status: "degraded".into(),
            live_sessions,
        }
    }
}
