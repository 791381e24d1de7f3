use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{
        envelope::{ApiResult, CreatedResult, created, ok},
        evaluation::{CreateEvaluationRequest, EvaluationResponse, TeamEvaluationsResponse},
        extract::JsonBody,
    },
    services::evaluation_service,
    state::SharedState,
};

/// Routes for evaluations of a debate's recordings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/debates/{debateId}/evaluations",
            get(list_evaluations).post(create_evaluation),
        )
        .route(
            "/debates/{debateId}/evaluations/{recordingId}",
            get(get_recording_evaluation),
        )
        .route(
            "/debates/{debateId}/teams/{team}/evaluations",
            get(team_evaluations),
        )
}

/// Store a judge's evaluation of a recording.
#[utoipa::path(
    post,
    path = "/debates/{debateId}/evaluations",
    tag = "evaluations",
    params(("debateId" = String, Path, description = "Debate identifier")),
    request_body = CreateEvaluationRequest,
    responses(
        (status = 201, description = "Evaluation stored", body = EvaluationResponse),
        (status = 400, description = "INVALID_INPUT, INVALID_SCORE, INVALID_TEAM or INVALID_ROUND_TYPE"),
        (status = 404, description = "DEBATE_NOT_FOUND or RECORDING_NOT_FOUND")
    )
)]
pub async fn create_evaluation(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
    JsonBody(payload): JsonBody<CreateEvaluationRequest>,
) -> CreatedResult<EvaluationResponse> {
    Ok(created(
        evaluation_service::create_evaluation(&state, &debate_id, payload).await?,
    ))
}

/// Evaluations of a debate.
#[utoipa::path(
    get,
    path = "/debates/{debateId}/evaluations",
    tag = "evaluations",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "Evaluations by creation time", body = [EvaluationResponse]),
        (status = 404, description = "DEBATE_NOT_FOUND")
    )
)]
pub async fn list_evaluations(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> ApiResult<Vec<EvaluationResponse>> {
    Ok(ok(
        evaluation_service::list_evaluations(&state, &debate_id).await?,
    ))
}

/// Evaluation attached to a recording.
#[utoipa::path(
    get,
    path = "/debates/{debateId}/evaluations/{recordingId}",
    tag = "evaluations",
    params(
        ("debateId" = String, Path, description = "Debate identifier"),
        ("recordingId" = String, Path, description = "Evaluated recording")
    ),
    responses(
        (status = 200, description = "Evaluation of the recording", body = EvaluationResponse),
        (status = 404, description = "DEBATE_NOT_FOUND or EVALUATION_NOT_FOUND")
    )
)]
pub async fn get_recording_evaluation(
    State(state): State<SharedState>,
    Path((debate_id, recording_id)): Path<(String, String)>,
) -> ApiResult<EvaluationResponse> {
    Ok(ok(evaluation_service::get_recording_evaluation(
        &state,
        &debate_id,
        &recording_id,
    )
    .await?))
}

/// Evaluations for one team with their total and average.
#[utoipa::path(
    get,
    path = "/debates/{debateId}/teams/{team}/evaluations",
    tag = "evaluations",
    params(
        ("debateId" = String, Path, description = "Debate identifier"),
        ("team" = String, Path, description = "`A` or `B`")
    ),
    responses(
        (status = 200, description = "Team evaluations with total and average", body = TeamEvaluationsResponse),
        (status = 400, description = "INVALID_TEAM"),
        (status = 404, description = "DEBATE_NOT_FOUND")
    )
)]
pub async fn team_evaluations(
    State(state): State<SharedState>,
    Path((debate_id, team)): Path<(String, String)>,
) -> ApiResult<TeamEvaluationsResponse> {
    Ok(ok(
        evaluation_service::team_evaluations(&state, &debate_id, &team).await?,
    ))
}
