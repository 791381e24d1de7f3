//! Business logic behind the evaluation routes.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::EvaluationEntity,
    dto::evaluation::{CreateEvaluationRequest, EvaluationResponse, TeamEvaluationsResponse},
    error::{ErrorCode, ServiceError},
    services::{
        debate_service::{parse_id, require_debate},
        recording_service::recording_not_found,
    },
    state::{
        SharedState,
        rounds::{RoundType, Team},
    },
};

/// Inclusive bounds of an evaluation score.
pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

fn parse_team(raw: &str) -> Result<Team, ServiceError> {
    match raw {
        "A" => Ok(Team::A),
        "B" => Ok(Team::B),
        _ => Err(ServiceError::invalid(ErrorCode::InvalidTeam, "Team must be A or B")),
    }
}

/// Store a new evaluation of a recording in this debate.
pub async fn create_evaluation(
    state: &SharedState,
    raw_debate_id: &str,
    request: CreateEvaluationRequest,
) -> Result<EvaluationResponse, ServiceError> {
    let (Some(recording_id), Some(team), Some(round_type), Some(score)) = (
        request.recording_id,
        request.team.as_deref(),
        request.round_type.as_deref(),
        request.score,
    ) else {
        return Err(ServiceError::invalid(
            ErrorCode::InvalidInput,
            "Missing required fields: recordingId, team, roundType, score",
        ));
    };
    if !SCORE_RANGE.contains(&score) {
        return Err(ServiceError::invalid(
            ErrorCode::InvalidScore,
            "Score must be between 0 and 100",
        ));
    }
    let team = parse_team(team)?;
    let round_type = round_type
        .parse::<RoundType>()
        .map_err(|err| ServiceError::invalid(ErrorCode::InvalidRoundType, err.to_string()))?;
    request.validate()?;

    let debate_id = parse_id(raw_debate_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    require_debate(&store, debate_id).await?;

    let entity = EvaluationEntity {
        id: Uuid::new_v4(),
        debate_id,
        recording_id,
        team,
        round_type,
        score: score as i32,
        feedback: request.feedback.unwrap_or_default(),
        strengths: request.strengths,
        weaknesses: request.weaknesses,
        created_at: OffsetDateTime::now_utc(),
    };
    if !store.add_evaluation(entity.clone()).await? {
        return Err(recording_not_found(recording_id));
    }

    info!(
        evaluation_id = %entity.id,
        %debate_id,
        %team,
        %round_type,
        score,
        "evaluation created"
    );
    Ok(entity.into())
}

/// Evaluations of a debate by creation time.
pub async fn list_evaluations(
    state: &SharedState,
    raw_debate_id: &str,
) -> Result<Vec<EvaluationResponse>, ServiceError> {
    let debate_id = parse_id(raw_debate_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    require_debate(&store, debate_id).await?;
    let evaluations = store.list_evaluations(debate_id).await?;
    Ok(evaluations.into_iter().map(Into::into).collect())
}

/// First evaluation recorded for `raw_recording_id` in the debate.
pub async fn get_recording_evaluation(
    state: &SharedState,
    raw_debate_id: &str,
    raw_recording_id: &str,
) -> Result<EvaluationResponse, ServiceError> {
    let debate_id = parse_id(raw_debate_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    let debate = require_debate(&store, debate_id).await?;

    let not_found = || {
        ServiceError::not_found(
            ErrorCode::EvaluationNotFound,
            format!("Evaluation for recording {raw_recording_id} not found"),
        )
    };
    let recording_id = Uuid::parse_str(raw_recording_id).map_err(|_| not_found())?;
    debate
        .evaluations
        .into_iter()
        .find(|evaluation| evaluation.recording_id == recording_id)
        .map(Into::into)
        .ok_or_else(not_found)
}

/// Evaluations of one team with their total and average. The team is checked first.
pub async fn team_evaluations(
    state: &SharedState,
    raw_debate_id: &str,
    raw_team: &str,
) -> Result<TeamEvaluationsResponse, ServiceError> {
    let team = parse_team(raw_team)?;
    let debate_id = parse_id(raw_debate_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    let debate = require_debate(&store, debate_id).await?;

    let evaluations = debate
        .evaluations
        .into_iter()
        .filter(|evaluation| evaluation.team == team)
        .map(Into::into)
        .collect();
    Ok(TeamEvaluationsResponse::for_team(team, evaluations))
}
