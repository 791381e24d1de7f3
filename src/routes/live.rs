use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::{get, post},
};
use futures::Stream;
use tracing::info;

use crate::{
    dto::{
        envelope::{ApiResult, CreatedResult, created, ok},
        live::LiveSessionResponse,
    },
    error::AppError,
    services::{live_service, sse_service},
    state::SharedState,
};

/// Routes hosting live debate sessions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/debates/{debateId}/live",
            get(get_session).post(open_session).delete(close_session),
        )
        .route("/debates/{debateId}/live/events", get(live_events))
        .route("/debates/{debateId}/live/advance/{team}", post(advance))
        .route("/debates/{debateId}/live/{action}", post(apply_action))
}

#[utoipa::path(
    post,
    path = "/debates/{debateId}/live",
    tag = "live",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 201, description = "Live session opened in setup", body = LiveSessionResponse),
        (status = 404, description = "DEBATE_NOT_FOUND"),
        (status = 409, description = "LIVE_SESSION_EXISTS")
    )
)]
/// Open a live session from the stored debate config.
pub async fn open_session(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> CreatedResult<LiveSessionResponse> {
    Ok(created(live_service::open_session(&state, &debate_id).await?))
}

/// Current snapshot of a live session.
#[utoipa::path(
    get,
    path = "/debates/{debateId}/live",
    tag = "live",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "Latest snapshot", body = LiveSessionResponse),
        (status = 404, description = "LIVE_SESSION_NOT_FOUND")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> ApiResult<LiveSessionResponse> {
    Ok(ok(live_service::get_session(&state, &debate_id)?))
}

/// Stop and remove a live session.
#[utoipa::path(
    delete,
    path = "/debates/{debateId}/live",
    tag = "live",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "Final snapshot", body = LiveSessionResponse),
        (status = 404, description = "LIVE_SESSION_NOT_FOUND")
    )
)]
pub async fn close_session(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> ApiResult<LiveSessionResponse> {
    Ok(ok(live_service::close_session(&state, &debate_id).await?))
}

/// Apply a control action to a live session.
#[utoipa::path(
    post,
    path = "/debates/{debateId}/live/{action}",
    tag = "live",
    params(
        ("debateId" = String, Path, description = "Debate identifier"),
        ("action" = String, Path, description = "start, pause, resume, finish, next, skip or previous")
    ),
    responses(
        (status = 200, description = "Snapshot after the action", body = LiveSessionResponse),
        (status = 400, description = "INVALID_INPUT"),
        (status = 404, description = "LIVE_SESSION_NOT_FOUND"),
        (status = 409, description = "INVALID_TRANSITION")
    )
)]
pub async fn apply_action(
    State(state): State<SharedState>,
    Path((debate_id, action)): Path<(String, String)>,
) -> ApiResult<LiveSessionResponse> {
    Ok(ok(
        live_service::apply_action(&state, &debate_id, &action).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/debates/{debateId}/live/advance/{team}",
    tag = "live",
    params(
        ("debateId" = String, Path, description = "Debate identifier"),
        ("team" = String, Path, description = "`A` or `B`")
    ),
    responses(
        (status = 200, description = "Snapshot at the team's next turn", body = LiveSessionResponse),
        (status = 400, description = "INVALID_TEAM"),
        (status = 409, description = "INVALID_TRANSITION or NO_TURN_AHEAD")
    )
)]
/// Jump to the next turn held by `team`.
pub async fn advance(
    State(state): State<SharedState>,
    Path((debate_id, team)): Path<(String, String)>,
) -> ApiResult<LiveSessionResponse> {
    Ok(ok(
        live_service::advance_to_team(&state, &debate_id, &team).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/debates/{debateId}/live/events",
    tag = "live",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "`session.snapshot` events", content_type = "text/event-stream", body = String),
        (status = 404, description = "LIVE_SESSION_NOT_FOUND")
    )
)]
/// Stream snapshots of the live session.
pub async fn live_events(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (id, receiver) = live_service::subscribe(&state, &debate_id)?;
    info!(debate_id = %id, "new live SSE connection");
    Ok(sse_service::snapshot_stream(id, receiver))
}
