use sqlx::{FromRow, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::PostgresDaoError;
use crate::{
    dao::models::{DebateEntity, EvaluationEntity, RecordingEntity},
    state::rounds::{DebateConfig, RoundDurations},
};

#[derive(Debug, FromRow)]
pub(super) struct DebateRow {
    pub id: Uuid,
    pub team_a_name: String,
    pub team_b_name: String,
    pub debate_topic: String,
    pub format_variant: String,
    pub round_durations: Json<RoundDurations>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub(super) struct RecordingRow {
    pub id: Uuid,
    pub debate_id: Uuid,
    pub team: String,
    pub round_type: String,
    pub round_order: i32,
    pub duration: i32,
    pub file_path: Option<String>,
    pub mime_type: Option<String>,
    pub transcription: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub(super) struct EvaluationRow {
    pub id: Uuid,
    pub debate_id: Uuid,
    pub recording_id: Uuid,
    pub team: String,
    pub round_type: String,
    pub score: i32,
    pub feedback: Option<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub created_at: OffsetDateTime,
}

fn corrupt(table: &'static str, id: Uuid, err: impl ToString) -> PostgresDaoError {
    PostgresDaoError::Corrupt {
        table,
        id,
        message: err.to_string(),
    }
}

impl TryFrom<DebateRow> for DebateEntity {
    type Error = PostgresDaoError;

    fn try_from(row: DebateRow) -> Result<Self, Self::Error> {
        let format = row
            .format_variant
            .parse()
            .map_err(|err| corrupt("debates", row.id, err))?;
        let status = row
            .status
            .parse()
            .map_err(|err| corrupt("debates", row.id, err))?;
        Ok(DebateEntity {
            id: row.id,
            config: DebateConfig {
                team_a_name: row.team_a_name,
                team_b_name: row.team_b_name,
                debate_topic: row.debate_topic,
                format,
                round_durations: row.round_durations.0,
            },
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<RecordingRow> for RecordingEntity {
    type Error = PostgresDaoError;

    fn try_from(row: RecordingRow) -> Result<Self, Self::Error> {
        Ok(RecordingEntity {
            id: row.id,
            debate_id: row.debate_id,
            team: row
                .team
                .parse()
                .map_err(|err| corrupt("recordings", row.id, err))?,
            round_type: row
                .round_type
                .parse()
                .map_err(|err| corrupt("recordings", row.id, err))?,
            order: row.round_order,
            duration: row.duration,
            file_path: row.file_path,
            mime_type: row.mime_type,
            transcription: row.transcription,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<EvaluationRow> for EvaluationEntity {
    type Error = PostgresDaoError;

    fn try_from(row: EvaluationRow) -> Result<Self, Self::Error> {
        Ok(EvaluationEntity {
            id: row.id,
            debate_id: row.debate_id,
            recording_id: row.recording_id,
            team: row
                .team
                .parse()
                .map_err(|err| corrupt("evaluations", row.id, err))?,
            round_type: row
                .round_type
                .parse()
                .map_err(|err| corrupt("evaluations", row.id, err))?,
            score: row.score,
            feedback: row.feedback.unwrap_or_default(),
            strengths: row.strengths,
            weaknesses: row.weaknesses,
            created_at: row.created_at,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one.
pub(super) fn convert_all<R, E>(rows: Vec<R>) -> Result<Vec<E>, PostgresDaoError>
where
    E: TryFrom<R, Error = PostgresDaoError>,
{
    rows.into_iter().map(E::try_from).collect()
}
