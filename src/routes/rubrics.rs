use axum::{
    Router,
    extract::Path,
    routing::{get, post},
};

use crate::{
    dto::{
        envelope::{ApiResult, ok},
        extract::JsonBody,
        rubric::{RubricResponse, ScoreSheetRequest, ScoreSheetResponse},
    },
    services::scoring_service,
    state::SharedState,
};

/// Rubric lookup and scoring routes. Stateless.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rubrics/{format}", get(get_rubric))
        .route("/rubrics/{format}/score", post(score_sheet))
}

/// Rubric definition for a format.
#[utoipa::path(
    get,
    path = "/rubrics/{format}",
    tag = "rubrics",
    params(("format" = String, Path, description = "`UPCT` or `RETOR`")),
    responses(
        (status = 200, description = "Rubric sections and scale", body = RubricResponse),
        (status = 400, description = "INVALID_FORMAT")
    )
)]
pub async fn get_rubric(Path(format): Path<String>) -> ApiResult<RubricResponse> {
    Ok(ok(scoring_service::get_rubric(&format)?))
}

#[utoipa::path(
    post,
    path = "/rubrics/{format}/score",
    tag = "rubrics",
    params(("format" = String, Path, description = "`UPCT` or `RETOR`")),
    request_body = ScoreSheetRequest,
    responses(
        (status = 200, description = "Clamped scores, totals and winner", body = ScoreSheetResponse),
        (status = 400, description = "INVALID_FORMAT, INVALID_TEAM or UNKNOWN_CRITERION")
    )
)]
/// Score a judge's sheet against the format's rubric.
pub async fn score_sheet(
    Path(format): Path<String>,
    JsonBody(payload): JsonBody<ScoreSheetRequest>,
) -> ApiResult<ScoreSheetResponse> {
    Ok(ok(scoring_service::score_sheet(&format, payload)?))
}
