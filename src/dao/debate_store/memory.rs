//! In-process [`DebateStore`] used when no database URL is configured and in tests.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    debate_store::DebateStore,
    models::{
        DebateAggregate, DebateEntity, DebateStatus, EvaluationEntity, RecordingEntity,
        TeamTotalsEntity,
    },
    storage::StorageResult,
};

/// Insertion counter used to keep ordering stable when timestamps tie.
type Seq = u64;

/// [`DebateStore`] kept in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDebateStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    seq: AtomicU64,
    debates: DashMap<Uuid, (Seq, DebateEntity)>,
    recordings: DashMap<Uuid, (Seq, RecordingEntity)>,
    evaluations: DashMap<Uuid, (Seq, EvaluationEntity)>,
}

impl MemoryDebateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> Seq {
        self.inner.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn recordings_of(&self, debate_id: Uuid) -> Vec<RecordingEntity> {
        let mut rows: Vec<(Seq, RecordingEntity)> = self
            .inner
            .recordings
            .iter()
            .filter(|entry| entry.value().1.debate_id == debate_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, recording)| (recording.order, *seq));
        rows.into_iter().map(|(_, recording)| recording).collect()
    }

    fn evaluations_of(&self, debate_id: Uuid) -> Vec<EvaluationEntity> {
        let mut rows: Vec<(Seq, EvaluationEntity)> = self
            .inner
            .evaluations
            .iter()
            .filter(|entry| entry.value().1.debate_id == debate_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, evaluation)| (evaluation.created_at, *seq));
        rows.into_iter().map(|(_, evaluation)| evaluation).collect()
    }

    fn aggregate(&self, debate: DebateEntity) -> DebateAggregate {
        let recordings = self.recordings_of(debate.id);
        let evaluations = self.evaluations_of(debate.id);
        DebateAggregate {
            debate,
            recordings,
            evaluations,
        }
    }
}

impl DebateStore for MemoryDebateStore {
    fn create_debate(&self, debate: DebateEntity) -> BoxFuture<'static, StorageResult<DebateEntity>> {
        let seq = self.next_seq();
        self.inner.debates.insert(debate.id, (seq, debate.clone()));
        Box::pin(async move { Ok(debate) })
    }

    fn find_debate(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DebateAggregate>>> {
        let debate = self
            .inner
            .debates
            .get(&id)
            .map(|entry| entry.value().1.clone());
        let aggregate = debate.map(|debate| self.aggregate(debate));
        Box::pin(async move { Ok(aggregate) })
    }

    fn list_debates(&self) -> BoxFuture<'static, StorageResult<Vec<DebateAggregate>>> {
        let mut debates: Vec<(Seq, DebateEntity)> = self
            .inner
            .debates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        debates.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        let aggregates = debates
            .into_iter()
            .map(|(_, debate)| self.aggregate(debate))
            .collect();
        Box::pin(async move { Ok(aggregates) })
    }

    fn update_status(
        &self,
        id: Uuid,
        status: DebateStatus,
        at: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let updated = match self.inner.debates.get_mut(&id) {
            Some(mut entry) => {
                entry.1.status = status;
                entry.1.updated_at = at;
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(updated) })
    }

    fn add_recording(&self, recording: RecordingEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let added = if self.inner.debates.contains_key(&recording.debate_id) {
            let seq = self.next_seq();
            self.inner.recordings.insert(recording.id, (seq, recording));
            true
        } else {
            false
        };
        Box::pin(async move { Ok(added) })
    }

    fn list_recordings(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RecordingEntity>>> {
        let recordings = self.recordings_of(debate_id);
        Box::pin(async move { Ok(recordings) })
    }

    fn find_recording(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RecordingEntity>>> {
        let recording = self
            .inner
            .recordings
            .get(&id)
            .map(|entry| entry.value().1.clone());
        Box::pin(async move { Ok(recording) })
    }

    fn update_transcription(
        &self,
        id: Uuid,
        transcription: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let updated = match self.inner.recordings.get_mut(&id) {
            Some(mut entry) => {
                entry.1.transcription = Some(transcription);
                true
            }
            None => false,
        };
        Box::pin(async move { Ok(updated) })
    }

    fn add_evaluation(&self, evaluation: EvaluationEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let recording_matches = self
            .inner
            .recordings
            .get(&evaluation.recording_id)
            .is_some_and(|entry| entry.value().1.debate_id == evaluation.debate_id);
        let added = if recording_matches {
            let seq = self.next_seq();
            self.inner.evaluations.insert(evaluation.id, (seq, evaluation));
            true
        } else {
            false
        };
        Box::pin(async move { Ok(added) })
    }

    fn list_evaluations(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EvaluationEntity>>> {
        let evaluations = self.evaluations_of(debate_id);
        Box::pin(async move { Ok(evaluations) })
    }

    fn team_totals(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<TeamTotalsEntity>> {
        let totals = TeamTotalsEntity::from_evaluations(&self.evaluations_of(debate_id));
        Box::pin(async move { Ok(totals) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::state::rounds::{DebateConfig, FormatVariant, RoundType, Team};

    fn debate(created_at: OffsetDateTime) -> DebateEntity {
        DebateEntity {
            id: Uuid::new_v4(),
            config: DebateConfig::new("A", "B", "topic", FormatVariant::Upct),
            status: DebateStatus::Active,
            created_at,
            updated_at: created_at,
        }
    }

    fn recording(debate_id: Uuid, order: i32) -> RecordingEntity {
        RecordingEntity {
            id: Uuid::new_v4(),
            debate_id,
            team: Team::A,
            round_type: RoundType::Introduccion,
            order,
            duration: 170,
            file_path: None,
            mime_type: None,
            transcription: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn evaluation(recording: &RecordingEntity, team: Team, score: i32) -> EvaluationEntity {
        EvaluationEntity {
            id: Uuid::new_v4(),
            debate_id: recording.debate_id,
            recording_id: recording.id,
            team,
            round_type: recording.round_type,
            score,
            feedback: String::new(),
            strengths: vec![],
            weaknesses: vec![],
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryDebateStore::new();
        let now = OffsetDateTime::now_utc();
        let older = store.create_debate(debate(now - Duration::hours(1))).await.unwrap();
        let newer = store.create_debate(debate(now)).await.unwrap();

        let ids: Vec<_> = store
            .list_debates()
            .await
            .unwrap()
            .into_iter()
            .map(|aggregate| aggregate.debate.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn recordings_ordered_by_round() {
        let store = MemoryDebateStore::new();
        let debate = store.create_debate(debate(OffsetDateTime::now_utc())).await.unwrap();
        assert!(store.add_recording(recording(debate.id, 3)).await.unwrap());
        assert!(store.add_recording(recording(debate.id, 1)).await.unwrap());

        let orders: Vec<_> = store
            .list_recordings(debate.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.order)
            .collect();
        assert_eq!(orders, vec![1, 3]);
    }

    #[tokio::test]
    async fn writes_require_parent_rows() {
        let store = MemoryDebateStore::new();
        let orphan = recording(Uuid::new_v4(), 1);
        assert!(!store.add_recording(orphan.clone()).await.unwrap());
        assert!(!store.add_evaluation(evaluation(&orphan, Team::A, 50)).await.unwrap());
        assert!(!store
            .update_status(Uuid::new_v4(), DebateStatus::Completed, OffsetDateTime::now_utc())
            .await
            .unwrap());
        assert!(!store
            .update_transcription(Uuid::new_v4(), "text".into())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn totals_sum_per_team() {
        let store = MemoryDebateStore::new();
        let debate = store.create_debate(debate(OffsetDateTime::now_utc())).await.unwrap();
        let rec = recording(debate.id, 1);
        store.add_recording(rec.clone()).await.unwrap();
        store.add_evaluation(evaluation(&rec, Team::A, 85)).await.unwrap();
        store.add_evaluation(evaluation(&rec, Team::B, 60)).await.unwrap();
        store.add_evaluation(evaluation(&rec, Team::B, 30)).await.unwrap();

        let totals = store.team_totals(debate.id).await.unwrap();
        assert_eq!(totals, TeamTotalsEntity { team_a: 85, team_b: 90 });

        let aggregate = store.find_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(aggregate.evaluations.len(), 3);
        assert_eq!(aggregate.recordings.len(), 1);
    }

    #[tokio::test]
    async fn status_and_transcription_updates_persist() {
        let store = MemoryDebateStore::new();
        let debate = store.create_debate(debate(OffsetDateTime::now_utc())).await.unwrap();
        let rec = recording(debate.id, 1);
        store.add_recording(rec.clone()).await.unwrap();

        assert!(store
            .update_status(debate.id, DebateStatus::Archived, OffsetDateTime::now_utc())
            .await
            .unwrap());
        assert!(store.update_transcription(rec.id, "hola".into()).await.unwrap());

        let aggregate = store.find_debate(debate.id).await.unwrap().unwrap();
        assert_eq!(aggregate.debate.status, DebateStatus::Archived);
        assert_eq!(aggregate.recordings[0].transcription.as_deref(), Some("hola"));
    }
}
