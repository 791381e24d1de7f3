//! DTO definitions for evaluations.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::EvaluationEntity,
    state::rounds::{RoundType, Team},
};

/// Body of `POST /debates/{debateId}/evaluations`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    /// Recording being scored; must belong to the debate.
    pub recording_id: Option<Uuid>,
    /// `A` or `B`.
    pub team: Option<String>,
    /// Round type display name or ASCII alias.
    pub round_type: Option<String>,
    /// Integer in `0..=100`.
    pub score: Option<i64>,
    /// Free-form judge feedback.
    #[validate(length(max = 10000))]
    pub feedback: Option<String>,
    /// Up to 50 short entries.
    #[serde(default)]
    #[validate(
        length(max = 50),
        custom(function = "crate::dto::validation::validate_list_entries")
    )]
    pub strengths: Vec<String>,
    /// Up to 50 short entries.
    #[serde(default)]
    #[validate(
        length(max = 50),
        custom(function = "crate::dto::validation::validate_list_entries")
    )]
    pub weaknesses: Vec<String>,
}

/// Stored evaluation as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    /// Evaluation identifier.
    pub id: Uuid,
    /// Owning debate.
    pub debate_id: Uuid,
    /// Scored recording.
    pub recording_id: Uuid,
    /// Team the score counts for.
    pub team: Team,
    /// Round of the scored turn.
    pub round_type: RoundType,
    /// Integer in `0..=100`.
    pub score: i32,
    /// Judge feedback, empty when none was given.
    pub feedback: String,
    /// Listed strengths.
    pub strengths: Vec<String>,
    /// Listed weaknesses.
    pub weaknesses: Vec<String>,
    /// Submission time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
}

impl From<EvaluationEntity> for EvaluationResponse {
    fn from(entity: EvaluationEntity) -> Self {
        Self {
            id: entity.id,
            debate_id: entity.debate_id,
            recording_id: entity.recording_id,
            team: entity.team,
            round_type: entity.round_type,
            score: entity.score,
            feedback: entity.feedback,
            strengths: entity.strengths,
            weaknesses: entity.weaknesses,
            timestamp: entity.created_at,
        }
    }
}

/// `GET /debates/{debateId}/teams/{team}/evaluations`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamEvaluationsResponse {
    /// Team the list was filtered by.
    pub team: Team,
    /// Its evaluations by creation time.
    pub evaluations: Vec<EvaluationResponse>,
    /// Sum of their scores.
    pub total_score: i64,
    /// `0` when the team has no evaluations.
    pub average_score: f64,
}

impl TeamEvaluationsResponse {
    /// Aggregate the evaluations belonging to `team`.
    pub fn for_team(team: Team, evaluations: Vec<EvaluationResponse>) -> Self {
        let total_score: i64 = evaluations.iter().map(|e| i64::from(e.score)).sum();
        let average_score = if evaluations.is_empty() {
            0.0
        } else {
            total_score as f64 / evaluations.len() as f64
        };
        Self {
            team,
            evaluations,
            total_score,
            average_score,
        }
    }
}
