//! DTO definitions for rubrics and score sheets.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{
    rounds::{FormatVariant, Team},
    rubric::{Rubric, RubricScale, RubricSection},
    scoring::ScoreSummary,
};

/// Rubric of one format.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RubricResponse {
    /// Format the rubric scores.
    pub format: FormatVariant,
    /// Score range.
    pub scale: RubricScale,
    /// Sections in round order.
    pub sections: Vec<RubricSection>,
}

impl From<&Rubric> for RubricResponse {
    fn from(rubric: &Rubric) -> Self {
        Self {
            format: rubric.format(),
            scale: rubric.scale(),
            sections: rubric.sections().to_vec(),
        }
    }
}

/// One criterion score entered by a judge.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntryInput {
    /// `A` or `B`.
    pub team: String,
    /// Rubric criterion id.
    pub criterion_id: String,
    /// Clamped to the rubric scale.
    pub score: i64,
}

/// Connection bonus per team; absent values keep the scale default.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BonusInput {
    /// Team A bonus.
    #[serde(rename = "A")]
    pub a: Option<i64>,
    /// Team B bonus.
    #[serde(rename = "B")]
    pub b: Option<i64>,
}

/// Body of `POST /rubrics/{format}/score`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSheetRequest {
    /// Entries applied in order; later ones overwrite earlier ones.
    #[serde(default)]
    pub scores: Vec<ScoreEntryInput>,
    /// Connection bonus overrides.
    #[serde(default)]
    pub bonus: BonusInput,
}

/// A submitted score after clamping.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEntry {
    /// Team scored.
    pub team: Team,
    /// Criterion scored.
    pub criterion_id: String,
    /// Value stored after clamping.
    pub score: u8,
}

/// Effective connection bonus per team.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamBonus {
    /// Team A bonus.
    #[serde(rename = "A")]
    pub a: u8,
    /// Team B bonus.
    #[serde(rename = "B")]
    pub b: u8,
}

/// Scored sheet: clamped entries, bonuses and the totals with the winner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSheetResponse {
    /// Format the sheet was scored with.
    pub format: FormatVariant,
    /// Submitted entries after clamping.
    pub scores: Vec<ScoredEntry>,
    /// Bonus applied per team.
    pub bonus: TeamBonus,
    /// Totals and winner.
    pub summary: ScoreSummary,
}
