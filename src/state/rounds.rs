//! Fixed round templates for the supported debate formats and the generator that
//! expands a [`DebateConfig`] into the ordered list of speaking turns.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Number of speaking turns in every supported format (4 round types × 2 teams).
pub const ROUND_COUNT: usize = 8;

/// Side of the debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Team {
    /// Proposing side, opens every round type but the last and closes the debate.
    A,
    /// Opposing side.
    B,
}

impl Team {
    /// The other side.
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    /// Single-letter wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Team::A => "A",
            Team::B => "B",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string is neither `A` nor `B`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("team must be A or B (got `{0}`)")]
pub struct ParseTeamError(pub String);

impl FromStr for Team {
    type Err = ParseTeamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" | "a" => Ok(Team::A),
            "B" | "b" => Ok(Team::B),
            other => Err(ParseTeamError(other.to_owned())),
        }
    }
}

/// Debate structure variant selected at setup time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum FormatVariant {
    /// Academic format: introduction, two rebuttals and conclusion; 0–4 rubric.
    #[default]
    #[serde(rename = "UPCT", alias = "upct")]
    Upct,
    /// RETOR format: contextualisation, definition, assessment and conclusion; 1–5 rubric.
    #[serde(rename = "RETOR", alias = "retor")]
    Retor,
}

impl FormatVariant {
    /// Wire representation of the variant.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatVariant::Upct => "UPCT",
            FormatVariant::Retor => "RETOR",
        }
    }

    /// Round types used by the variant, in speaking order.
    pub fn round_types(self) -> [RoundType; 4] {
        match self {
            FormatVariant::Upct => [
                RoundType::Introduccion,
                RoundType::PrimerRefutador,
                RoundType::SegundoRefutador,
                RoundType::Conclusion,
            ],
            FormatVariant::Retor => [
                RoundType::Contextualizacion,
                RoundType::Definicion,
                RoundType::Valoracion,
                RoundType::Conclusion,
            ],
        }
    }

    /// Default durations for every round type of the variant.
    pub fn default_durations(self) -> RoundDurations {
        self.round_types()
            .into_iter()
            .map(|round_type| (round_type, round_type.default_duration()))
            .collect()
    }

    fn template(self) -> &'static [(u8, Team, RoundType); ROUND_COUNT] {
        match self {
            FormatVariant::Upct => &UPCT_TEMPLATE,
            FormatVariant::Retor => &RETOR_TEMPLATE,
        }
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a format tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown debate format `{0}`")]
pub struct ParseFormatError(pub String);

impl FromStr for FormatVariant {
    type Err = ParseFormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UPCT" => Ok(FormatVariant::Upct),
            "RETOR" => Ok(FormatVariant::Retor),
            _ => Err(ParseFormatError(value.to_owned())),
        }
    }
}

/// Named phase of a debate format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum RoundType {
    /// Opening speech.
    #[serde(rename = "Introducción", alias = "introduccion", alias = "Introduccion")]
    Introduccion,
    /// First rebuttal.
    #[serde(rename = "Primer Refutador", alias = "primer_refutador", alias = "primerRefutador")]
    PrimerRefutador,
    /// Second rebuttal.
    #[serde(rename = "Segundo Refutador", alias = "segundo_refutador", alias = "segundoRefutador")]
    SegundoRefutador,
    /// Closing speech, shared by both formats.
    #[serde(rename = "Conclusión", alias = "conclusion", alias = "Conclusion")]
    Conclusion,
    /// RETOR opening: framing of the motion.
    #[serde(rename = "Contextualización", alias = "contextualizacion", alias = "Contextualizacion")]
    Contextualizacion,
    /// RETOR definition of terms.
    #[serde(rename = "Definición", alias = "definicion", alias = "Definicion")]
    Definicion,
    /// RETOR assessment.
    #[serde(rename = "Valoración", alias = "valoracion", alias = "Valoracion")]
    Valoracion,
}

const ALL_ROUND_TYPES: [RoundType; 7] = [
    RoundType::Introduccion,
    RoundType::PrimerRefutador,
    RoundType::SegundoRefutador,
    RoundType::Conclusion,
    RoundType::Contextualizacion,
    RoundType::Definicion,
    RoundType::Valoracion,
];

impl RoundType {
    /// Display name used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundType::Introduccion => "Introducción",
            RoundType::PrimerRefutador => "Primer Refutador",
            RoundType::SegundoRefutador => "Segundo Refutador",
            RoundType::Conclusion => "Conclusión",
            RoundType::Contextualizacion => "Contextualización",
            RoundType::Definicion => "Definición",
            RoundType::Valoracion => "Valoración",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            RoundType::Introduccion => "introduccion",
            RoundType::PrimerRefutador => "primer_refutador",
            RoundType::SegundoRefutador => "segundo_refutador",
            RoundType::Conclusion => "conclusion",
            RoundType::Contextualizacion => "contextualizacion",
            RoundType::Definicion => "definicion",
            RoundType::Valoracion => "valoracion",
        }
    }

    /// Fallback duration (seconds) substituted when a config omits this round type.
    pub fn default_duration(self) -> u32 {
        match self {
            RoundType::Introduccion | RoundType::Conclusion => 180,
            RoundType::PrimerRefutador | RoundType::SegundoRefutador => 240,
            RoundType::Contextualizacion => 360,
            RoundType::Definicion => 120,
            RoundType::Valoracion => 300,
        }
    }
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a round type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown round type `{0}`")]
pub struct ParseRoundTypeError(pub String);

impl FromStr for RoundType {
    type Err = ParseRoundTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalized = trimmed.to_lowercase().replace([' ', '-'], "_");
        ALL_ROUND_TYPES
            .into_iter()
            .find(|candidate| {
                candidate.as_str() == trimmed
                    || candidate.slug() == normalized
                    || candidate.slug().replace('_', "") == normalized.replace('_', "")
            })
            .ok_or_else(|| ParseRoundTypeError(value.to_owned()))
    }
}

/// Per-round-type speaking time, in seconds.
pub type RoundDurations = BTreeMap<RoundType, u32>;

/// Setup-time configuration of a debate. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateConfig {
    /// Display name of side A.
    pub team_a_name: String,
    /// Display name of side B.
    pub team_b_name: String,
    /// Motion under debate.
    pub debate_topic: String,
    /// Round template and rubric scale.
    #[serde(default)]
    pub format: FormatVariant,
    /// Speaking time per round type; gaps fall back to defaults.
    #[serde(default)]
    pub round_durations: RoundDurations,
}

impl DebateConfig {
    /// Build a config using the default durations of `format`.
    pub fn new(
        team_a_name: impl Into<String>,
        team_b_name: impl Into<String>,
        debate_topic: impl Into<String>,
        format: FormatVariant,
    ) -> Self {
        Self {
            team_a_name: team_a_name.into(),
            team_b_name: team_b_name.into(),
            debate_topic: debate_topic.into(),
            format,
            round_durations: format.default_durations(),
        }
    }

    /// Display name of the given side.
    pub fn team_name(&self, team: Team) -> &str {
        match team {
            Team::A => &self.team_a_name,
            Team::B => &self.team_b_name,
        }
    }

    /// Duration configured for `round_type`, or its default when the map has no entry.
    pub fn duration_for(&self, round_type: RoundType) -> u32 {
        self.round_durations
            .get(&round_type)
            .copied()
            .unwrap_or_else(|| round_type.default_duration())
    }
}

/// One timed speaking turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebateRound {
    /// 1-based position in the sequence.
    pub order: u8,
    /// Side holding the floor.
    pub team: Team,
    /// Phase of the format this turn belongs to.
    pub round_type: RoundType,
    /// Speaking time in seconds, copied from the config at generation time.
    pub duration: u32,
}

const UPCT_TEMPLATE: [(u8, Team, RoundType); ROUND_COUNT] = [
    (1, Team::A, RoundType::Introduccion),
    (2, Team::B, RoundType::Introduccion),
    (3, Team::A, RoundType::PrimerRefutador),
    (4, Team::B, RoundType::PrimerRefutador),
    (5, Team::A, RoundType::SegundoRefutador),
    (6, Team::B, RoundType::SegundoRefutador),
    // Closing pair is reversed: the proposing side gets the last word.
    (7, Team::B, RoundType::Conclusion),
    (8, Team::A, RoundType::Conclusion),
];

const RETOR_TEMPLATE: [(u8, Team, RoundType); ROUND_COUNT] = [
    (1, Team::A, RoundType::Contextualizacion),
    (2, Team::B, RoundType::Contextualizacion),
    (3, Team::A, RoundType::Definicion),
    (4, Team::B, RoundType::Definicion),
    (5, Team::A, RoundType::Valoracion),
    (6, Team::B, RoundType::Valoracion),
    (7, Team::B, RoundType::Conclusion),
    (8, Team::A, RoundType::Conclusion),
];

/// Expand `config` into its fixed sequence of [`ROUND_COUNT`] rounds.
pub fn generate(config: &DebateConfig) -> Vec<DebateRound> {
    config
        .format
        .template()
        .iter()
        .map(|&(order, team, round_type)| DebateRound {
            order,
            team,
            round_type,
            duration: config.duration_for(round_type),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upct() -> DebateConfig {
        DebateConfig::new("Equipo A", "Equipo B", "Tema", FormatVariant::Upct)
    }

    #[test]
    fn every_format_yields_eight_rounds() {
        for format in [FormatVariant::Upct, FormatVariant::Retor] {
            let config = DebateConfig::new("x", "y", "z", format);
            assert_eq!(generate(&config).len(), ROUND_COUNT);
        }
    }

    #[test]
    fn closing_pair_is_reversed() {
        for format in [FormatVariant::Upct, FormatVariant::Retor] {
            let rounds = generate(&DebateConfig::new("x", "y", "z", format));
            for pair in rounds.chunks(2).take(3) {
                assert_eq!((pair[0].team, pair[1].team), (Team::A, Team::B));
                assert_eq!(pair[0].round_type, pair[1].round_type);
            }
            assert_eq!((rounds[6].team, rounds[7].team), (Team::B, Team::A));
            assert_eq!(rounds[6].round_type, RoundType::Conclusion);
        }
    }

    #[test]
    fn upct_scenario_durations() {
        let rounds = generate(&upct());
        assert_eq!(
            rounds[0],
            DebateRound {
                order: 1,
                team: Team::A,
                round_type: RoundType::Introduccion,
                duration: 180
            }
        );
        assert_eq!(rounds[2].duration, 240);
        assert_eq!(rounds[4].duration, 240);
        assert_eq!(
            (rounds[6].team, rounds[6].round_type, rounds[6].duration),
            (Team::B, RoundType::Conclusion, 180)
        );
        assert_eq!(
            (rounds[7].team, rounds[7].round_type, rounds[7].duration),
            (Team::A, RoundType::Conclusion, 180)
        );
    }

    #[test]
    fn missing_durations_fall_back_to_defaults() {
        let mut config = upct();
        config.round_durations.clear();
        config
            .round_durations
            .insert(RoundType::PrimerRefutador, 90);

        let rounds = generate(&config);
        assert_eq!(rounds[0].duration, 180);
        assert_eq!(rounds[2].duration, 90);
        assert_eq!(rounds[4].duration, 240);
    }

    #[test]
    fn generation_is_deterministic() {
        let config = DebateConfig::new("x", "y", "z", FormatVariant::Retor);
        assert_eq!(generate(&config), generate(&config));
    }

    #[test]
    fn round_type_parsing_accepts_display_names_and_slugs() {
        assert_eq!("Introducción".parse(), Ok(RoundType::Introduccion));
        assert_eq!("primer_refutador".parse(), Ok(RoundType::PrimerRefutador));
        assert_eq!("Segundo Refutador".parse(), Ok(RoundType::SegundoRefutador));
        assert_eq!("valoracion".parse(), Ok(RoundType::Valoracion));
        assert!("Réplica".parse::<RoundType>().is_err());
    }

    #[test]
    fn round_type_serializes_as_display_name() {
        let json = serde_json::to_string(&RoundType::Conclusion).unwrap();
        assert_eq!(json, "\"Conclusión\"");
        let parsed: RoundType = serde_json::from_str("\"definicion\"").unwrap();
        assert_eq!(parsed, RoundType::Definicion);
    }

    #[test]
    fn team_parsing() {
        assert_eq!("A".parse(), Ok(Team::A));
        assert_eq!("b".parse(), Ok(Team::B));
        assert!("C".parse::<Team>().is_err());
        assert_eq!(Team::A.opponent(), Team::B);
    }
}
