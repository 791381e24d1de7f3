//! Evaluation rubrics for the two debate formats. The scales never mix: a sheet built
//! from one [`Rubric`] variant only accepts that variant's criteria and range.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::rounds::{FormatVariant, RoundType};

/// Score range of a rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RubricScale {
    /// Lowest score a criterion accepts.
    pub min: u8,
    /// Highest score a criterion accepts.
    pub max: u8,
    /// Lowest team connection bonus.
    pub bonus_min: u8,
    /// Highest team connection bonus.
    pub bonus_max: u8,
    /// Bonus assumed until a judge sets one.
    pub bonus_default: u8,
}

impl RubricScale {
    /// Clamp a criterion score into `[min, ceiling]`.
    pub fn clamp(&self, value: i64, ceiling: u8) -> u8 {
        clamp_into(value, self.min, ceiling.min(self.max))
    }

    /// Clamp a connection bonus into its range.
    pub fn clamp_bonus(&self, value: i64) -> u8 {
        clamp_into(value, self.bonus_min, self.bonus_max)
    }
}

fn clamp_into(value: i64, min: u8, max: u8) -> u8 {
    let clamped = value.clamp(i64::from(min), i64::from(max));
    u8::try_from(clamped).unwrap_or(min)
}

/// A single scored aspect of a speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Identifier, unique within the rubric.
    pub id: String,
    /// What the judge scores.
    pub description: String,
    /// Ceiling for this criterion, never above the scale maximum.
    pub max_score: u8,
    /// Orienting sub-items read by the judge, not scored on their own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guidance: Vec<String>,
}

/// Criteria for one round type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RubricSection {
    /// Round these criteria apply to.
    pub round_type: RoundType,
    /// Display name.
    pub name: String,
    /// Criteria in display order.
    pub criteria: Vec<Criterion>,
}

impl RubricSection {
    /// Highest total this section can award.
    pub fn max_total(&self) -> u32 {
        self.criteria.iter().map(|c| u32::from(c.max_score)).sum()
    }
}

/// Scale plus ordered sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RubricDefinition {
    /// Score range shared by every criterion.
    pub scale: RubricScale,
    /// One section per round type, in round order.
    pub sections: Vec<RubricSection>,
}

/// Rubric tagged by the format it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rubric {
    /// 0–4 per criterion, bonus 0–4 defaulting to 0.
    Upct(RubricDefinition),
    /// 1–5 per block, bonus 1–5 defaulting to 1.
    Retor(RubricDefinition),
}

impl Rubric {
    /// Rubric used to score `format`.
    pub fn for_format(format: FormatVariant) -> Self {
        match format {
            FormatVariant::Upct => Self::upct(),
            FormatVariant::Retor => Self::retor(),
        }
    }

    /// Academic rubric: ten criteria per speech, scored 0–4.
    pub fn upct() -> Self {
        let scale = RubricScale {
            min: 0,
            max: 4,
            bonus_min: 0,
            bonus_max: 4,
            bonus_default: 0,
        };
        let sections = UPCT_SECTIONS
            .iter()
            .map(|(round_type, name, criteria)| build_section(*round_type, name, criteria, scale.max))
            .collect();
        Rubric::Upct(RubricDefinition { scale, sections })
    }

    /// RETOR rubric: the same five blocks in every phase, scored 1–5.
    pub fn retor() -> Self {
        let scale = RubricScale {
            min: 1,
            max: 5,
            bonus_min: 1,
            bonus_max: 5,
            bonus_default: 1,
        };
        let sections = RETOR_PHASES
            .iter()
            .map(|(round_type, name, phase)| RubricSection {
                round_type: *round_type,
                name: (*name).to_owned(),
                criteria: RETOR_BLOCKS
                    .iter()
                    .map(|(block, title, guidance)| Criterion {
                        id: format!("{phase}.{block}"),
                        description: (*title).to_owned(),
                        max_score: scale.max,
                        guidance: guidance.iter().map(|item| (*item).to_owned()).collect(),
                    })
                    .collect(),
            })
            .collect();
        Rubric::Retor(RubricDefinition { scale, sections })
    }

    /// Format this rubric belongs to.
    pub fn format(&self) -> FormatVariant {
        match self {
            Rubric::Upct(_) => FormatVariant::Upct,
            Rubric::Retor(_) => FormatVariant::Retor,
        }
    }

    /// Scale and sections, whatever the variant.
    pub fn definition(&self) -> &RubricDefinition {
        match self {
            Rubric::Upct(def) | Rubric::Retor(def) => def,
        }
    }

    /// Score range.
    pub fn scale(&self) -> RubricScale {
        self.definition().scale
    }

    /// Sections in round order.
    pub fn sections(&self) -> &[RubricSection] {
        &self.definition().sections
    }

    /// Every criterion, in section order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.sections().iter().flat_map(|section| section.criteria.iter())
    }

    /// Criterion by id.
    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria().find(|criterion| criterion.id == id)
    }
}

fn build_section(
    round_type: RoundType,
    name: &str,
    criteria: &[(&str, &str)],
    max_score: u8,
) -> RubricSection {
    RubricSection {
        round_type,
        name: name.to_owned(),
        criteria: criteria
            .iter()
            .map(|(id, description)| Criterion {
                id: (*id).to_owned(),
                description: (*description).to_owned(),
                max_score,
                guidance: Vec::new(),
            })
            .collect(),
    }
}

type SectionSpec = (RoundType, &'static str, &'static [(&'static str, &'static str)]);

const INTRO_CLOSING: &str =
    "Introduce el discurso de forma llamativa y cierra correctamente su intervención.";
const QUESTIONS: &str = "Pertinencia de las preguntas/respuestas. 0 si no \"pasa\" pregunta cuando tiene oportunidad. 4 si no le hacen preguntas.";
const CRITICAL: &str =
    "Habilidad crítica y creativa para mostrar la verosimilitud de las evidencias.";
const REASONING: &str = "Habilidad de razonamiento y argumentación.";
const OPPONENTS: &str =
    "Comprensión de la premisa y los argumentos de los equipos oponentes y su refutación.";
const COMMUNICATION: &str = "Habilidad para comunicar el mensaje con eficacia y liderazgo.";
const LANGUAGE: &str = "Uso y riqueza del lenguaje.";
const TIMING: &str = "Ajuste al tiempo establecido. Se penaliza si se queda a más de 20s de terminar o se excede más de 10s.";

const UPCT_SECTIONS: [SectionSpec; 4] = [
    (
        RoundType::Introduccion,
        "Introducciones",
        &[
            ("intro-closing", INTRO_CLOSING),
            ("statu-quo", "Presenta el statu quo y definiciones pertinentes."),
            (
                "argument-line",
                "Presenta o desarrolla la línea argumental y/o cita la solución innovadora propuesta.",
            ),
            ("questions", QUESTIONS),
            ("critical-thinking", CRITICAL),
            ("reasoning", REASONING),
            (
                "comprehension",
                "Comprensión de la premisa y postura del equipo contrario (refuta o adelanta refutación).",
            ),
            ("communication", COMMUNICATION),
            ("language", LANGUAGE),
            ("time-management", TIMING),
        ],
    ),
    (
        RoundType::PrimerRefutador,
        "Refutación 1",
        &[
            ("ref1-intro-closing", INTRO_CLOSING),
            (
                "ref1-argument-line",
                "Desarrolla la línea argumental y la solución innovadora propuesta.",
            ),
            (
                "ref1-refutation",
                "Refuta/adelanta refutación y se defiende de las refutaciones del equipo contrario.",
            ),
            ("ref1-questions", QUESTIONS),
            ("ref1-critical-thinking", CRITICAL),
            ("ref1-reasoning", REASONING),
            ("ref1-comprehension", OPPONENTS),
            ("ref1-communication", COMMUNICATION),
            ("ref1-language", LANGUAGE),
            ("ref1-time-management", TIMING),
        ],
    ),
    (
        RoundType::SegundoRefutador,
        "Refutación 2",
        &[
            ("ref2-intro-closing", INTRO_CLOSING),
            (
                "ref2-refutation-defense",
                "Refuta y se defiende de las refutaciones del equipo contrario justificando los puntos de choque de las líneas argumentales.",
            ),
            (
                "ref2-reconstruct",
                "Reconstruye la línea argumental o la solución propuesta.",
            ),
            ("ref2-questions", QUESTIONS),
            ("ref2-critical-thinking", CRITICAL),
            ("ref2-reasoning", REASONING),
            ("ref2-comprehension", OPPONENTS),
            ("ref2-communication", COMMUNICATION),
            ("ref2-language", LANGUAGE),
            ("ref2-time-management", TIMING),
        ],
    ),
    (
        RoundType::Conclusion,
        "Conclusiones",
        &[
            ("conc-intro-closing", INTRO_CLOSING),
            ("conc-summary", "Resume sin añadir información."),
            (
                "conc-justification",
                "Justifica los puntos de acogida y choque con su propia línea argumental y solución.",
            ),
            (
                "conc-reivindication",
                "Reivindicación de postura propia (énfasis en la tesis del equipo).",
            ),
            (
                "conc-exordio",
                "Explicación del exordio/frase usados por el equipo.",
            ),
            ("conc-reasoning", REASONING),
            ("conc-comprehension", OPPONENTS),
            ("conc-communication", COMMUNICATION),
            ("conc-language", LANGUAGE),
            ("conc-time-management", TIMING),
        ],
    ),
];

/// A RETOR evaluation block: id, title and the orienting sub-items judges read.
type RetorBlock = (&'static str, &'static str, &'static [&'static str]);

/// RETOR evaluates every phase against the same five blocks.
const RETOR_BLOCKS: [RetorBlock; 5] = [
    (
        "comprension_mocion",
        "Comprensión de la moción y del desarrollo del debate",
        &[
            "Ajuste a la moción: los argumentos son claros, comprensibles y defendidos con razonamientos sólidos.",
            "Coherencia contextual: el contexto expuesto explica la situación del debate y justifica por qué su postura es necesaria o adecuada.",
            "Anticipación a la refutación: el equipo conoce los puntos fuertes del rival y los débiles propios, anticipando críticas o respondiendo a posibles ataques.",
            "Desarrollo lógico: los argumentos se presentan ordenados y conectados entre fases (definición, contexto, valoración).",
            "Cierre sintético: en la conclusión el equipo sintetiza los principales acuerdos y desacuerdos sin introducir información nueva.",
        ],
    ),
    (
        "relevancia_informacion",
        "Relevancia de la información presentada",
        &[
            "Pertinencia de la información: los datos, ejemplos y argumentos apoyan directamente la línea argumental del equipo.",
            "Uso crítico: la información no se enumera sin más; se explica, se conecta con la moción y se usa para refutar o comparar.",
            "Fiabilidad de fuentes: el equipo justifica o contextualiza la credibilidad de las fuentes, estudios o ejemplos utilizados.",
        ],
    ),
    (
        "argumentacion_refutacion",
        "Argumentación y refutación",
        &[
            "Calidad argumentativa: los argumentos son claros, comprensibles y defendidos con razonamientos sólidos.",
            "Refutación efectiva: el equipo responde directamente a los argumentos del rival y explica por qué su postura es superior.",
        ],
    ),
    (
        "oratoria_persuasion",
        "Oratoria y capacidad persuasiva",
        &[
            "Claridad expresiva: mensajes comprensibles, bien estructurados y adaptados al tiempo disponible.",
            "Persuasión: el discurso resulta convincente, seguro y coherente con la estrategia del equipo.",
        ],
    ),
    (
        "trabajo_equipo",
        "Trabajo en equipo y uso del formato RETOR",
        &[
            "Coordinación del equipo: las intervenciones están conectadas entre sí y responden a una estrategia común.",
            "Uso del tiempo RETOR: el equipo gestiona los tiempos, respeta las fases y utiliza adecuadamente el minuto de oro.",
        ],
    ),
];

const RETOR_PHASES: [(RoundType, &str, &str); 4] = [
    (RoundType::Contextualizacion, "Contextualización", "contextualizacion"),
    (RoundType::Definicion, "Definición", "definicion"),
    (RoundType::Valoracion, "Valoración", "valoracion"),
    (RoundType::Conclusion, "Conclusión", "conclusion"),
];
