//! DTO definitions for debate creation, lookup and results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{DebateAggregate, DebateStatus, TeamTotalsEntity},
    dto::{evaluation::EvaluationResponse, recording::RecordingResponse},
    state::{
        rounds::DebateConfig,
        scoring::{Outcome, determine_winner},
    },
};

/// Debate configuration as submitted by clients. Every field is optional on the wire so
/// missing values can be reported together.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DebateConfigInput {
    /// Display name of team A.
    #[validate(
        length(max = 200),
        custom(function = "crate::dto::validation::validate_not_blank")
    )]
    pub team_a_name: Option<String>,
    /// Display name of team B.
    #[validate(
        length(max = 200),
        custom(function = "crate::dto::validation::validate_not_blank")
    )]
    pub team_b_name: Option<String>,
    /// Motion being debated.
    #[validate(
        length(max = 1000),
        custom(function = "crate::dto::validation::validate_not_blank")
    )]
    pub debate_topic: Option<String>,
    /// `UPCT` (default) or `RETOR`.
    pub format: Option<String>,
    /// Seconds per round type, keyed by display name or ASCII alias.
    #[schema(value_type = Option<Object>)]
    pub round_durations: Option<BTreeMap<String, u32>>,
}

/// Body of `POST /debates`: either `{config: {...}}` or the config fields inline.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebateRequest {
    /// Nested config; wins over the inline fields.
    #[serde(default)]
    pub config: Option<DebateConfigInput>,
    /// Config fields given at the top level.
    #[serde(flatten)]
    pub inline: DebateConfigInput,
}

impl CreateDebateRequest {
    /// The nested config when present, otherwise the inline fields.
    pub fn into_input(self) -> DebateConfigInput {
        self.config.unwrap_or(self.inline)
    }
}

/// Body of `PATCH /debates/{debateId}/status`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// `active`, `completed` or `archived`.
    pub status: Option<String>,
}

/// Per-team sums of evaluation scores with the resulting outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalScore {
    /// Sum of team A evaluation scores.
    pub team_a: i64,
    /// Sum of team B evaluation scores.
    pub team_b: i64,
    /// Strict comparison of the sums.
    pub winner: Outcome,
}

impl From<TeamTotalsEntity> for TotalScore {
    fn from(totals: TeamTotalsEntity) -> Self {
        let clamp = |value: i64| u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        Self {
            team_a: totals.team_a,
            team_b: totals.team_b,
            winner: determine_winner(clamp(totals.team_a), clamp(totals.team_b)),
        }
    }
}

/// Full debate view with its recordings, evaluations and computed totals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebateResponse {
    /// Debate identifier.
    pub id: Uuid,
    /// Setup the debate was created with.
    #[schema(value_type = Object)]
    pub config: DebateConfig,
    /// Recordings by round order.
    pub recordings: Vec<RecordingResponse>,
    /// Evaluations by creation time.
    pub evaluations: Vec<EvaluationResponse>,
    /// Lifecycle status.
    pub status: DebateStatus,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    /// Last status change.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    /// Recomputed on every read.
    pub total_score: TotalScore,
}

impl From<DebateAggregate> for DebateResponse {
    fn from(aggregate: DebateAggregate) -> Self {
        let totals = TeamTotalsEntity::from_evaluations(&aggregate.evaluations);
        let DebateAggregate {
            debate,
            recordings,
            evaluations,
        } = aggregate;
        Self {
            id: debate.id,
            config: debate.config,
            recordings: recordings.into_iter().map(Into::into).collect(),
            evaluations: evaluations.into_iter().map(Into::into).collect(),
            status: debate.status,
            created_at: debate.created_at,
            updated_at: debate.updated_at,
            total_score: totals.into(),
        }
    }
}

/// Debate header included in the results payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebateSummary {
    /// Debate identifier.
    pub id: Uuid,
    /// Setup the debate was created with.
    #[schema(value_type = Object)]
    pub config: DebateConfig,
    /// Lifecycle status.
    pub status: DebateStatus,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

/// `GET /debates/{debateId}/results`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    /// Debate header.
    pub debate: DebateSummary,
    /// Every evaluation of the debate.
    pub evaluations: Vec<EvaluationResponse>,
    /// Per-team sums and winner.
    pub total_score: TotalScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_config_takes_precedence() {
        let request: CreateDebateRequest = serde_json::from_value(serde_json::json!({
            "config": {"teamAName": "Rojo", "teamBName": "Azul", "debateTopic": "IA"},
            "teamAName": "ignored"
        }))
        .unwrap();
        let input = request.into_input();
        assert_eq!(input.team_a_name.as_deref(), Some("Rojo"));
        assert_eq!(input.debate_topic.as_deref(), Some("IA"));
    }

    #[test]
    fn inline_fields_are_accepted() {
        let request: CreateDebateRequest = serde_json::from_value(serde_json::json!({
            "teamAName": "Rojo",
            "teamBName": "Azul",
            "debateTopic": "IA",
            "format": "RETOR",
            "roundDurations": {"definicion": 90}
        }))
        .unwrap();
        let input = request.into_input();
        assert_eq!(input.format.as_deref(), Some("RETOR"));
        assert_eq!(input.round_durations.unwrap()["definicion"], 90);
    }

    #[test]
    fn totals_pick_strict_winner() {
        let draw = TotalScore::from(TeamTotalsEntity { team_a: 80, team_b: 80 });
        assert_eq!(draw.winner, Outcome::Draw);
        let b = TotalScore::from(TeamTotalsEntity { team_a: 70, team_b: 85 });
        assert_eq!(b.winner, Outcome::B);
    }
}
