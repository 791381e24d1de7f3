//! Storage-side records for debates, recordings and evaluations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::rounds::{DebateConfig, RoundType, Team};

/// Lifecycle status of a persisted debate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebateStatus {
    /// Created and not yet closed.
    #[default]
    Active,
    /// All rounds were delivered.
    Completed,
    /// Retained for reference only.
    Archived,
}

impl DebateStatus {
    /// Lowercase wire and column value.
    pub fn as_str(self) -> &'static str {
        match self {
            DebateStatus::Active => "active",
            DebateStatus::Completed => "completed",
            DebateStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status must be active, completed or archived (got `{0}`)")]
pub struct ParseStatusError(pub String);

impl FromStr for DebateStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(DebateStatus::Active),
            "completed" => Ok(DebateStatus::Completed),
            "archived" => Ok(DebateStatus::Archived),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

/// Debate row: identity, config and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateEntity {
    /// Debate identifier.
    pub id: Uuid,
    /// Setup the debate was created with.
    pub config: DebateConfig,
    /// Lifecycle status.
    pub status: DebateStatus,
    /// Creation time.
    pub created_at: OffsetDateTime,
    /// Last status change.
    pub updated_at: OffsetDateTime,
}

/// Debate with its recordings (by round order) and evaluations (by creation time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateAggregate {
    /// The debate row.
    pub debate: DebateEntity,
    /// Its recordings.
    pub recordings: Vec<RecordingEntity>,
    /// Its evaluations.
    pub evaluations: Vec<EvaluationEntity>,
}

/// Metadata of an uploaded audio recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntity {
    /// Recording identifier.
    pub id: Uuid,
    /// Owning debate.
    pub debate_id: Uuid,
    /// Speaking team.
    pub team: Team,
    /// Round the turn belongs to.
    pub round_type: RoundType,
    /// 1-based round position within the debate.
    pub order: i32,
    /// Length in whole seconds.
    pub duration: i32,
    /// Location of the stored audio, relative to the upload directory.
    pub file_path: Option<String>,
    /// MIME type sent with the upload.
    pub mime_type: Option<String>,
    /// Attached transcription, if any.
    pub transcription: Option<String>,
    /// Upload time.
    pub created_at: OffsetDateTime,
}

/// Score submitted for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationEntity {
    /// Evaluation identifier.
    pub id: Uuid,
    /// Owning debate.
    pub debate_id: Uuid,
    /// Recording being scored.
    pub recording_id: Uuid,
    /// Team the score counts for.
    pub team: Team,
    /// Round of the scored turn.
    pub round_type: RoundType,
    /// Integer in `0..=100`.
    pub score: i32,
    /// Free-form judge feedback.
    pub feedback: String,
    /// Listed strengths.
    pub strengths: Vec<String>,
    /// Listed weaknesses.
    pub weaknesses: Vec<String>,
    /// Submission time.
    pub created_at: OffsetDateTime,
}

/// Per-team sums of evaluation scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamTotalsEntity {
    /// Sum for team A.
    pub team_a: i64,
    /// Sum for team B.
    pub team_b: i64,
}

impl TeamTotalsEntity {
    /// Sum over `evaluations`, split by team.
    pub fn from_evaluations<'a>(evaluations: impl IntoIterator<Item = &'a EvaluationEntity>) -> Self {
        evaluations
            .into_iter()
            .fold(Self::default(), |mut totals, evaluation| {
                match evaluation.team {
                    Team::A => totals.team_a += i64::from(evaluation.score),
                    Team::B => totals.team_b += i64::from(evaluation.score),
                }
                totals
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(team: Team, score: i32) -> EvaluationEntity {
        EvaluationEntity {
            id: Uuid::new_v4(),
            debate_id: Uuid::nil(),
            recording_id: Uuid::nil(),
            team,
            round_type: RoundType::Introduccion,
            score,
            feedback: String::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn totals_split_by_team() {
        let evaluations = [
            evaluation(Team::A, 80),
            evaluation(Team::B, 70),
            evaluation(Team::A, 5),
        ];
        let totals = TeamTotalsEntity::from_evaluations(&evaluations);
        assert_eq!(totals.team_a, 85);
        assert_eq!(totals.team_b, 70);
    }

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!("archived".parse(), Ok(DebateStatus::Archived));
        assert!("Active".parse::<DebateStatus>().is_err());
    }
}
