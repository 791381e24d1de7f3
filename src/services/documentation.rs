use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for ciceron-back.
#[openapi(
    servers((url = "/api")),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::debates::create_debate,
        crate::routes::debates::list_debates,
        crate::routes::debates::get_debate,
        crate::routes::debates::update_status,
        crate::routes::debates::get_results,
        crate::routes::recordings::upload_recording,
        crate::routes::recordings::list_recordings,
        crate::routes::recordings::get_recording,
        crate::routes::recordings::update_recording,
        crate::routes::recordings::get_audio,
        crate::routes::evaluations::create_evaluation,
        crate::routes::evaluations::list_evaluations,
        crate::routes::evaluations::get_recording_evaluation,
        crate::routes::evaluations::team_evaluations,
        crate::routes::rubrics::get_rubric,
        crate::routes::rubrics::score_sheet,
        crate::routes::live::open_session,
        crate::routes::live::get_session,
        crate::routes::live::close_session,
        crate::routes::live::apply_action,
        crate::routes::live::advance,
        crate::routes::live::live_events,
    ),
    components(
        schemas(
            crate::error::ErrorCode,
            crate::dto::health::HealthResponse,
            crate::dto::debate::CreateDebateRequest,
            crate::dto::debate::DebateConfigInput,
            crate::dto::debate::UpdateStatusRequest,
            crate::dto::debate::DebateResponse,
            crate::dto::debate::DebateSummary,
            crate::dto::debate::ResultsResponse,
            crate::dto::debate::TotalScore,
            crate::dto::recording::UploadRecordingForm,
            crate::dto::recording::RecordingResponse,
            crate::dto::recording::UpdateRecordingRequest,
            crate::dto::evaluation::CreateEvaluationRequest,
            crate::dto::evaluation::EvaluationResponse,
            crate::dto::evaluation::TeamEvaluationsResponse,
            crate::dto::rubric::RubricResponse,
            crate::dto::rubric::ScoreSheetRequest,
            crate::dto::rubric::ScoreSheetResponse,
            crate::dto::live::LiveSessionResponse,
            crate::dao::models::DebateStatus,
            crate::state::rounds::Team,
            crate::state::rounds::RoundType,
            crate::state::rounds::FormatVariant,
            crate::state::scoring::Outcome,
            crate::state::state_machine::DebatePhase,
            crate::state::state_machine::SessionSnapshot,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "debates", description = "Debate sessions and results"),
        (name = "recordings", description = "Audio recordings of each round"),
        (name = "evaluations", description = "Scores and feedback per recording"),
        (name = "rubrics", description = "Format rubrics and score sheets"),
        (name = "live", description = "Server-hosted live sessions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/health",
            "/debates/{debateId}/recordings",
            "/debates/{debateId}/teams/{team}/evaluations",
            "/rubrics/{format}/score",
            "/debates/{debateId}/live/events",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
