//! PostgreSQL implementation of the debate store.

use std::{collections::HashMap, time::Duration};

use futures::future::BoxFuture;
use sqlx::{
    PgPool,
    postgres::PgPoolOptions,
    types::Json,
};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{
    error::{PostgresDaoError, PostgresResult},
    rows::{DebateRow, EvaluationRow, RecordingRow, convert_all},
};
use crate::dao::{
    debate_store::DebateStore,
    models::{
        DebateAggregate, DebateEntity, DebateStatus, EvaluationEntity, RecordingEntity,
        TeamTotalsEntity,
    },
    storage::StorageResult,
};

const DEBATE_COLUMNS: &str = "id, team_a_name, team_b_name, debate_topic, format_variant, \
     round_durations, status, created_at, updated_at";
const RECORDING_COLUMNS: &str = "id, debate_id, team, round_type, round_order, duration, \
     file_path, mime_type, transcription, created_at";
const EVALUATION_COLUMNS: &str = "id, debate_id, recording_id, team, round_type, score, \
     feedback, strengths, weaknesses, created_at";

/// Connection settings for [`PostgresDebateStore`].
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// `postgres://` connection string.
    pub url: String,
    /// Pool size cap.
    pub max_connections: u32,
    /// How long a query waits for a free connection.
    pub acquire_timeout: Duration,
}

impl PostgresConfig {
    /// Settings for `url` with a pool of five and a five second acquire timeout.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// [`DebateStore`] backed by PostgreSQL. Totals are computed in SQL.
#[derive(Clone)]
pub struct PostgresDebateStore {
    pool: PgPool,
}

impl PostgresDebateStore {
    /// Open a pool and apply pending migrations.
    pub async fn connect(config: &PostgresConfig) -> PostgresResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|source| PostgresDaoError::Connect { source })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|source| PostgresDaoError::Migrate { source })?;

        info!(max_connections = config.max_connections, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    async fn ping(&self) -> PostgresResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn create_debate(&self, debate: DebateEntity) -> PostgresResult<DebateEntity> {
        let id = debate.id;
        let row: DebateRow = sqlx::query_as(&format!(
            "INSERT INTO debates (id, team_a_name, team_b_name, debate_topic, format_variant, \
             round_durations, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {DEBATE_COLUMNS}"
        ))
        .bind(debate.id)
        .bind(&debate.config.team_a_name)
        .bind(&debate.config.team_b_name)
        .bind(&debate.config.debate_topic)
        .bind(debate.config.format.as_str())
        .bind(Json(&debate.config.round_durations))
        .bind(debate.status.as_str())
        .bind(debate.created_at)
        .bind(debate.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|source| PostgresDaoError::SaveDebate { id, source })?;

        row.try_into()
    }

    async fn find_debate(&self, id: Uuid) -> PostgresResult<Option<DebateAggregate>> {
        let row: Option<DebateRow> =
            sqlx::query_as(&format!("SELECT {DEBATE_COLUMNS} FROM debates WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|source| PostgresDaoError::LoadDebate { id, source })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let debate: DebateEntity = row.try_into()?;
        let recordings = self.list_recordings(id).await?;
        let evaluations = self.list_evaluations(id).await?;
        Ok(Some(DebateAggregate {
            debate,
            recordings,
            evaluations,
        }))
    }

    async fn list_debates(&self) -> PostgresResult<Vec<DebateAggregate>> {
        let map_err = |source| PostgresDaoError::ListDebates { source };

        let debates: Vec<DebateEntity> = convert_all(
            sqlx::query_as::<_, DebateRow>(&format!(
                "SELECT {DEBATE_COLUMNS} FROM debates ORDER BY created_at DESC"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?,
        )?;
        let ids: Vec<Uuid> = debates.iter().map(|debate| debate.id).collect();

        let recordings: Vec<RecordingEntity> = convert_all(
            sqlx::query_as::<_, RecordingRow>(&format!(
                "SELECT {RECORDING_COLUMNS} FROM recordings WHERE debate_id = ANY($1) \
                 ORDER BY round_order, created_at"
            ))
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?,
        )?;
        let evaluations: Vec<EvaluationEntity> = convert_all(
            sqlx::query_as::<_, EvaluationRow>(&format!(
                "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE debate_id = ANY($1) \
                 ORDER BY created_at"
            ))
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?,
        )?;

        let mut recordings_by_debate: HashMap<Uuid, Vec<RecordingEntity>> = HashMap::new();
        for recording in recordings {
            recordings_by_debate
                .entry(recording.debate_id)
                .or_default()
                .push(recording);
        }
        let mut evaluations_by_debate: HashMap<Uuid, Vec<EvaluationEntity>> = HashMap::new();
        for evaluation in evaluations {
            evaluations_by_debate
                .entry(evaluation.debate_id)
                .or_default()
                .push(evaluation);
        }

        Ok(debates
            .into_iter()
            .map(|debate| DebateAggregate {
                recordings: recordings_by_debate.remove(&debate.id).unwrap_or_default(),
                evaluations: evaluations_by_debate.remove(&debate.id).unwrap_or_default(),
                debate,
            })
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DebateStatus,
        at: OffsetDateTime,
    ) -> PostgresResult<bool> {
        let result = sqlx::query("UPDATE debates SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::UpdateDebate { id, source })?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_recording(&self, recording: RecordingEntity) -> PostgresResult<bool> {
        let id = recording.id;
        let result = sqlx::query(
            "INSERT INTO recordings (id, debate_id, team, round_type, round_order, duration, \
             file_path, mime_type, transcription, created_at) \
             SELECT $1::uuid, $2::uuid, $3::text, $4::text, $5::int4, $6::int4, $7::text, \
             $8::text, $9::text, $10::timestamptz \
             WHERE EXISTS (SELECT 1 FROM debates WHERE id = $2::uuid)",
        )
        .bind(recording.id)
        .bind(recording.debate_id)
        .bind(recording.team.as_str())
        .bind(recording.round_type.as_str())
        .bind(recording.order)
        .bind(recording.duration)
        .bind(recording.file_path)
        .bind(recording.mime_type)
        .bind(recording.transcription)
        .bind(recording.created_at)
        .execute(&self.pool)
        .await
        .map_err(|source| PostgresDaoError::SaveRecording { id, source })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_recordings(&self, debate_id: Uuid) -> PostgresResult<Vec<RecordingEntity>> {
        let rows: Vec<RecordingRow> = sqlx::query_as(&format!(
            "SELECT {RECORDING_COLUMNS} FROM recordings WHERE debate_id = $1 \
             ORDER BY round_order, created_at"
        ))
        .bind(debate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| PostgresDaoError::LoadRecording {
            id: debate_id,
            source,
        })?;
        convert_all(rows)
    }

    async fn find_recording(&self, id: Uuid) -> PostgresResult<Option<RecordingEntity>> {
        let row: Option<RecordingRow> =
            sqlx::query_as(&format!("SELECT {RECORDING_COLUMNS} FROM recordings WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|source| PostgresDaoError::LoadRecording { id, source })?;
        row.map(RecordingEntity::try_from).transpose()
    }

    async fn update_transcription(&self, id: Uuid, transcription: String) -> PostgresResult<bool> {
        let result = sqlx::query("UPDATE recordings SET transcription = $1 WHERE id = $2")
            .bind(transcription)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::UpdateRecording { id, source })?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_evaluation(&self, evaluation: EvaluationEntity) -> PostgresResult<bool> {
        let id = evaluation.id;
        let result = sqlx::query(
            "INSERT INTO evaluations (id, debate_id, recording_id, team, round_type, score, \
             feedback, strengths, weaknesses, created_at) \
             SELECT $1::uuid, $2::uuid, $3::uuid, $4::text, $5::text, $6::int4, $7::text, \
             $8::text[], $9::text[], $10::timestamptz \
             WHERE EXISTS (SELECT 1 FROM recordings WHERE id = $3::uuid AND debate_id = $2::uuid)",
        )
        .bind(evaluation.id)
        .bind(evaluation.debate_id)
        .bind(evaluation.recording_id)
        .bind(evaluation.team.as_str())
        .bind(evaluation.round_type.as_str())
        .bind(evaluation.score)
        .bind(evaluation.feedback)
        .bind(evaluation.strengths)
        .bind(evaluation.weaknesses)
        .bind(evaluation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|source| PostgresDaoError::SaveEvaluation { id, source })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_evaluations(&self, debate_id: Uuid) -> PostgresResult<Vec<EvaluationEntity>> {
        let rows: Vec<EvaluationRow> = sqlx::query_as(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE debate_id = $1 ORDER BY created_at"
        ))
        .bind(debate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| PostgresDaoError::LoadEvaluations { debate_id, source })?;
        convert_all(rows)
    }

    async fn team_totals(&self, debate_id: Uuid) -> PostgresResult<TeamTotalsEntity> {
        let (team_a, team_b): (i64, i64) = sqlx::query_as(
            "SELECT \
               COALESCE(SUM(CASE WHEN team = 'A' THEN score ELSE 0 END), 0)::BIGINT, \
               COALESCE(SUM(CASE WHEN team = 'B' THEN score ELSE 0 END), 0)::BIGINT \
             FROM evaluations WHERE debate_id = $1",
        )
        .bind(debate_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|source| PostgresDaoError::Totals { debate_id, source })?;
        Ok(TeamTotalsEntity { team_a, team_b })
    }
}

impl DebateStore for PostgresDebateStore {
    fn create_debate(&self, debate: DebateEntity) -> BoxFuture<'static, StorageResult<DebateEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_debate(debate).await.map_err(Into::into) })
    }

    fn find_debate(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DebateAggregate>>> {
        let store = self.clone();
        Box::pin(async move { store.find_debate(id).await.map_err(Into::into) })
    }

    fn list_debates(&self) -> BoxFuture<'static, StorageResult<Vec<DebateAggregate>>> {
        let store = self.clone();
        Box::pin(async move { store.list_debates().await.map_err(Into::into) })
    }

    fn update_status(
        &self,
        id: Uuid,
        status: DebateStatus,
        at: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update_status(id, status, at).await.map_err(Into::into) })
    }

    fn add_recording(&self, recording: RecordingEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.add_recording(recording).await.map_err(Into::into) })
    }

    fn list_recordings(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RecordingEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_recordings(debate_id).await.map_err(Into::into) })
    }

    fn find_recording(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RecordingEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_recording(id).await.map_err(Into::into) })
    }

    fn update_transcription(
        &self,
        id: Uuid,
        transcription: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_transcription(id, transcription)
                .await
                .map_err(Into::into)
        })
    }

    fn add_evaluation(&self, evaluation: EvaluationEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.add_evaluation(evaluation).await.map_err(Into::into) })
    }

    fn list_evaluations(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EvaluationEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_evaluations(debate_id).await.map_err(Into::into) })
    }

    fn team_totals(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<TeamTotalsEntity>> {
        let store = self.clone();
        Box::pin(async move { store.team_totals(debate_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
