use axum::{
    Router,
    extract::{Path, State},
    routing::{get, patch},
};

use crate::{
    dto::{
        debate::{CreateDebateRequest, DebateResponse, ResultsResponse, UpdateStatusRequest},
        envelope::{ApiResult, CreatedResult, created, ok},
        extract::JsonBody,
    },
    services::debate_service,
    state::SharedState,
};

/// Routes managing debate sessions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/debates", get(list_debates).post(create_debate))
        .route("/debates/{debateId}", get(get_debate))
        .route("/debates/{debateId}/status", patch(update_status))
        .route("/debates/{debateId}/results", get(get_results))
}

/// Create a debate from `{config: {...}}` or inline config fields.
#[utoipa::path(
    post,
    path = "/debates",
    tag = "debates",
    request_body = CreateDebateRequest,
    responses(
        (status = 201, description = "Debate created", body = DebateResponse),
        (status = 400, description = "INVALID_INPUT, INVALID_FORMAT or INVALID_ROUND_TYPE")
    )
)]
pub async fn create_debate(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CreateDebateRequest>,
) -> CreatedResult<DebateResponse> {
    Ok(created(debate_service::create_debate(&state, payload).await?))
}

/// List debates, newest first.
#[utoipa::path(
    get,
    path = "/debates",
    tag = "debates",
    responses((status = 200, description = "All debates", body = [DebateResponse]))
)]
pub async fn list_debates(State(state): State<SharedState>) -> ApiResult<Vec<DebateResponse>> {
    Ok(ok(debate_service::list_debates(&state).await?))
}

/// Fetch one debate with its recordings and evaluations.
#[utoipa::path(
    get,
    path = "/debates/{debateId}",
    tag = "debates",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "Debate with recordings and evaluations", body = DebateResponse),
        (status = 404, description = "DEBATE_NOT_FOUND")
    )
)]
pub async fn get_debate(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> ApiResult<DebateResponse> {
    Ok(ok(debate_service::get_debate(&state, &debate_id).await?))
}

/// Change a debate's lifecycle status.
#[utoipa::path(
    patch,
    path = "/debates/{debateId}/status",
    tag = "debates",
    params(("debateId" = String, Path, description = "Debate identifier")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated debate", body = DebateResponse),
        (status = 400, description = "INVALID_STATUS"),
        (status = 404, description = "DEBATE_NOT_FOUND")
    )
)]
pub async fn update_status(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateStatusRequest>,
) -> ApiResult<DebateResponse> {
    Ok(ok(
        debate_service::update_status(&state, &debate_id, payload).await?,
    ))
}

/// Debate header, evaluations and per-team totals.
#[utoipa::path(
    get,
    path = "/debates/{debateId}/results",
    tag = "debates",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "Debate results", body = ResultsResponse),
        (status = 404, description = "DEBATE_NOT_FOUND")
    )
)]
pub async fn get_results(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> ApiResult<ResultsResponse> {
    Ok(ok(debate_service::get_results(&state, &debate_id).await?))
}
