//! Score sheets over a [`Rubric`] and winner determination.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{rounds::Team, rubric::Rubric};

/// Result of comparing two team totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Outcome {
    /// Team A scored strictly more.
    A,
    /// Team B scored strictly more.
    B,
    /// Equal totals.
    #[serde(rename = "draw")]
    Draw,
}

impl Outcome {
    /// Winning team, if there is one.
    pub fn winner(self) -> Option<Team> {
        match self {
            Outcome::A => Some(Team::A),
            Outcome::B => Some(Team::B),
            Outcome::Draw => None,
        }
    }
}

/// Strict comparison of two totals; equality is a draw.
pub fn determine_winner(team_a: u32, team_b: u32) -> Outcome {
    match team_a.cmp(&team_b) {
        std::cmp::Ordering::Greater => Outcome::A,
        std::cmp::Ordering::Less => Outcome::B,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// Rejected score sheet entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The id names no criterion of the sheet's rubric.
    #[error("unknown criterion `{0}`")]
    UnknownCriterion(String),
}

/// Totals for both teams and the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    /// Team A total including its bonus.
    pub team_a: u32,
    /// Team B total including its bonus.
    pub team_b: u32,
    /// Strict comparison of the two.
    pub winner: Outcome,
}

/// Judge's sheet for one debate. Scores are keyed by `(team, criterion id)` and every
/// entry is clamped to the rubric's scale when set.
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    rubric: Rubric,
    scores: IndexMap<(Team, String), u8>,
    bonus: IndexMap<Team, u8>,
}

impl ScoreSheet {
    /// Every criterion starts at the scale minimum and the bonus at its default.
    pub fn new(rubric: Rubric) -> Self {
        let scale = rubric.scale();
        let mut scores = IndexMap::new();
        for team in [Team::A, Team::B] {
            for criterion in rubric.criteria() {
                scores.insert((team, criterion.id.clone()), scale.min);
            }
        }
        let bonus = [Team::A, Team::B]
            .into_iter()
            .map(|team| (team, scale.bonus_default))
            .collect();
        Self {
            rubric,
            scores,
            bonus,
        }
    }

    /// Rubric the sheet scores against.
    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Set a criterion score, returning the clamped value that was stored.
    pub fn set_score(
        &mut self,
        team: Team,
        criterion_id: &str,
        value: i64,
    ) -> Result<u8, ScoringError> {
        let criterion = self
            .rubric
            .criterion(criterion_id)
            .ok_or_else(|| ScoringError::UnknownCriterion(criterion_id.to_owned()))?;
        let clamped = self.rubric.scale().clamp(value, criterion.max_score);
        self.scores
            .insert((team, criterion_id.to_owned()), clamped);
        Ok(clamped)
    }

    /// Set the team connection bonus, returning the clamped value.
    pub fn set_bonus(&mut self, team: Team, value: i64) -> u8 {
        let clamped = self.rubric.scale().clamp_bonus(value);
        self.bonus.insert(team, clamped);
        clamped
    }

    /// Stored score of one criterion.
    pub fn score(&self, team: Team, criterion_id: &str) -> Option<u8> {
        self.scores.get(&(team, criterion_id.to_owned())).copied()
    }

    /// Current connection bonus.
    pub fn bonus(&self, team: Team) -> u8 {
        self.bonus
            .get(&team)
            .copied()
            .unwrap_or(self.rubric.scale().bonus_default)
    }

    /// Sum of the team's criterion scores plus its connection bonus.
    pub fn score_team(&self, team: Team) -> u32 {
        let criteria: u32 = self
            .scores
            .iter()
            .filter(|((owner, _), _)| *owner == team)
            .map(|(_, score)| u32::from(*score))
            .sum();
        criteria + u32::from(self.bonus(team))
    }

    /// Both totals and the outcome.
    pub fn summary(&self) -> ScoreSummary {
        let team_a = self.score_team(Team::A);
        let team_b = self.score_team(Team::B);
        ScoreSummary {
            team_a,
            team_b,
            winner: determine_winner(team_a, team_b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_sheet_scores_minimum_plus_default_bonus() {
        let upct = ScoreSheet::new(Rubric::upct());
        assert_eq!(upct.score_team(Team::A), 0);

        let retor = ScoreSheet::new(Rubric::retor());
        let criteria = retor.rubric().criteria().count() as u32;
        assert_eq!(retor.score_team(Team::B), criteria + 1);
        assert_eq!(retor.summary().winner, Outcome::Draw);
    }

    #[test]
    fn scores_are_clamped_on_entry() {
        let mut sheet = ScoreSheet::new(Rubric::upct());
        assert_eq!(sheet.set_score(Team::A, "reasoning", 9), Ok(4));
        assert_eq!(sheet.set_score(Team::A, "language", -2), Ok(0));
        assert_eq!(sheet.score(Team::A, "reasoning"), Some(4));
        assert_eq!(sheet.set_bonus(Team::B, 12), 4);
    }

    #[test]
    fn unknown_criterion_is_rejected() {
        let mut sheet = ScoreSheet::new(Rubric::upct());
        assert_eq!(
            sheet.set_score(Team::A, "ctx-reasoning", 3),
            Err(ScoringError::UnknownCriterion("ctx-reasoning".into()))
        );
        assert_eq!(sheet.score_team(Team::A), 0);
    }

    #[test]
    fn total_is_criteria_plus_bonus() {
        let mut sheet = ScoreSheet::new(Rubric::upct());
        sheet.set_score(Team::A, "reasoning", 3).unwrap();
        sheet.set_score(Team::A, "conc-summary", 4).unwrap();
        sheet.set_bonus(Team::A, 2);
        sheet.set_score(Team::B, "reasoning", 4).unwrap();

        let summary = sheet.summary();
        assert_eq!(summary.team_a, 9);
        assert_eq!(summary.team_b, 4);
        assert_eq!(summary.winner, Outcome::A);
    }

    #[test]
    fn winner_uses_strict_comparison() {
        assert_eq!(determine_winner(10, 10), Outcome::Draw);
        assert_eq!(determine_winner(11, 10), Outcome::A);
        assert_eq!(determine_winner(3, 4), Outcome::B);
        assert_eq!(Outcome::Draw.winner(), None);
        assert_eq!(serde_json::to_string(&Outcome::Draw).unwrap(), "\"draw\"");
    }
}
