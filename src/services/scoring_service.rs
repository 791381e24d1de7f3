//! Rubric lookup and score sheet evaluation.

use tracing::debug;

use crate::{
    dto::rubric::{RubricResponse, ScoreSheetRequest, ScoreSheetResponse, ScoredEntry, TeamBonus},
    error::{ErrorCode, ServiceError},
    state::{
        rounds::{FormatVariant, Team},
        rubric::Rubric,
        scoring::ScoreSheet,
    },
};

fn parse_format(raw: &str) -> Result<FormatVariant, ServiceError> {
    raw.parse()
        .map_err(|err: crate::state::rounds::ParseFormatError| {
            ServiceError::invalid(ErrorCode::InvalidFormat, err.to_string())
        })
}

/// Rubric of a format given by name.
pub fn get_rubric(raw_format: &str) -> Result<RubricResponse, ServiceError> {
    let rubric = Rubric::for_format(parse_format(raw_format)?);
    Ok(RubricResponse::from(&rubric))
}

/// Score a submitted sheet. Entries are clamped to the rubric scale; unknown criteria
/// and teams are rejected.
pub fn score_sheet(
    raw_format: &str,
    request: ScoreSheetRequest,
) -> Result<ScoreSheetResponse, ServiceError> {
    let format = parse_format(raw_format)?;
    let mut sheet = ScoreSheet::new(Rubric::for_format(format));

    let mut scores = Vec::with_capacity(request.scores.len());
    for entry in request.scores {
        let team: Team = entry
            .team
            .parse()
            .map_err(|_| ServiceError::invalid(ErrorCode::InvalidTeam, "Team must be A or B"))?;
        let score = sheet.set_score(team, &entry.criterion_id, entry.score)?;
        scores.push(ScoredEntry {
            team,
            criterion_id: entry.criterion_id,
            score,
        });
    }
    if let Some(bonus) = request.bonus.a {
        sheet.set_bonus(Team::A, bonus);
    }
    if let Some(bonus) = request.bonus.b {
        sheet.set_bonus(Team::B, bonus);
    }

    let summary = sheet.summary();
    debug!(
        format = format.as_str(),
        entries = scores.len(),
        team_a = summary.team_a,
        team_b = summary.team_b,
        "score sheet evaluated"
    );
    Ok(ScoreSheetResponse {
        format,
        scores,
        bonus: TeamBonus {
            a: sheet.bonus(Team::A),
            b: sheet.bonus(Team::B),
        },
        summary,
    })
}
