//! Storage trait for debates and its backends.

/// In-process store backed by concurrent maps.
pub mod memory;
/// PostgreSQL store.
#[cfg(feature = "postgres-store")]
pub mod postgres;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    models::{
        DebateAggregate, DebateEntity, DebateStatus, EvaluationEntity, RecordingEntity,
        TeamTotalsEntity,
    },
    storage::StorageResult,
};

/// Abstraction over the persistence layer for debates, recordings and evaluations.
///
/// Lookups return `None` (or `false` for updates) when the target row does not exist.
pub trait DebateStore: Send + Sync {
    /// Insert a new debate and return it as stored.
    fn create_debate(&self, debate: DebateEntity) -> BoxFuture<'static, StorageResult<DebateEntity>>;
    /// Debate with its recordings and evaluations.
    fn find_debate(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DebateAggregate>>>;
    /// All debates, newest first.
    fn list_debates(&self) -> BoxFuture<'static, StorageResult<Vec<DebateAggregate>>>;
    /// Set the status and `updated_at`. `false` when the debate is missing.
    fn update_status(
        &self,
        id: Uuid,
        status: DebateStatus,
        at: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Insert a recording. `false` when its debate is missing.
    fn add_recording(&self, recording: RecordingEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Recordings of a debate ordered by round order.
    fn list_recordings(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RecordingEntity>>>;
    /// Recording by id.
    fn find_recording(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RecordingEntity>>>;
    /// Replace a recording's transcription. `false` when the recording is missing.
    fn update_transcription(
        &self,
        id: Uuid,
        transcription: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Insert an evaluation. `false` when its recording is not part of its debate.
    fn add_evaluation(&self, evaluation: EvaluationEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Evaluations of a debate ordered by creation time.
    fn list_evaluations(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EvaluationEntity>>>;
    /// Evaluation score sums per team.
    fn team_totals(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<TeamTotalsEntity>>;
    /// Round-trip to the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
