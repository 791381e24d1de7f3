//! Business logic behind the recording routes: multipart upload, metadata and audio.

use std::{collections::HashMap, sync::Arc};

use axum::extract::Multipart;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{audio_files::extension_for, debate_store::DebateStore, models::RecordingEntity},
    dto::recording::{RecordingResponse, UpdateRecordingRequest},
    error::{ErrorCode, ServiceError},
    services::debate_service::{debate_not_found, parse_id, require_debate},
    state::{
        SharedState,
        rounds::{RoundType, Team},
    },
};

const REQUIRED_FIELDS: [&str; 4] = ["team", "roundType", "order", "duration"];

/// Audio part of an upload.
#[derive(Debug)]
struct AudioPart {
    file_name: Option<String>,
    mime_type: Option<String>,
    bytes: Vec<u8>,
}

/// All parts of an upload, read before any validation happens.
#[derive(Debug, Default)]
struct UploadParts {
    fields: HashMap<String, String>,
    audio: Option<AudioPart>,
}

async fn read_parts(mut multipart: Multipart, limit: usize) -> Result<UploadParts, ServiceError> {
    let mut parts = UploadParts::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "audio" {
            let file_name = field.file_name().map(str::to_owned);
            let mime_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await?;
            if bytes.len() > limit {
                return Err(ServiceError::TooLarge("File too large".into()));
            }
            parts.audio = Some(AudioPart {
                file_name,
                mime_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await?;
            parts.fields.insert(name, value);
        }
    }
    Ok(parts)
}

/// Validated upload metadata.
#[derive(Debug, PartialEq)]
struct UploadMetadata {
    team: Team,
    round_type: RoundType,
    order: i32,
    duration: i32,
}

fn parse_metadata(fields: &HashMap<String, String>) -> Result<UploadMetadata, ServiceError> {
    let get = |key: &str| fields.get(key).map(|value| value.trim()).filter(|value| !value.is_empty());
    if REQUIRED_FIELDS.iter().any(|key| get(key).is_none()) {
        return Err(ServiceError::invalid(
            ErrorCode::InvalidInput,
            "Missing required fields: team, roundType, order, duration",
        ));
    }
    let field = |key: &str| get(key).unwrap_or_default();

    let team = match field("team") {
        "A" => Team::A,
        "B" => Team::B,
        _ => return Err(ServiceError::invalid(ErrorCode::InvalidTeam, "Team must be A or B")),
    };
    let round_type = field("roundType")
        .parse::<RoundType>()
        .map_err(|err| ServiceError::invalid(ErrorCode::InvalidRoundType, err.to_string()))?;
    let order = field("order")
        .parse::<i32>()
        .ok()
        .filter(|order| *order >= 1)
        .ok_or_else(|| {
            ServiceError::invalid(ErrorCode::InvalidInput, "order must be a positive integer")
        })?;
    let duration = field("duration")
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0 && *secs <= f64::from(i32::MAX))
        .ok_or_else(|| {
            ServiceError::invalid(ErrorCode::InvalidInput, "duration must be a positive number")
        })?;

    Ok(UploadMetadata {
        team,
        round_type,
        order,
        duration: duration.round() as i32,
    })
}

/// Store an uploaded audio file and its metadata.
///
/// Checks run in this order: required fields, team, round type, numbers, file presence,
/// MIME type, then debate existence.
pub async fn upload_recording(
    state: &SharedState,
    raw_debate_id: &str,
    multipart: Multipart,
) -> Result<RecordingResponse, ServiceError> {
    let parts = read_parts(multipart, state.config().max_file_size).await?;
    let metadata = parse_metadata(&parts.fields)?;
    let audio = parts
        .audio
        .filter(|audio| !audio.bytes.is_empty())
        .ok_or_else(|| ServiceError::invalid(ErrorCode::NoFile, "No audio file provided"))?;
    let mime_type = audio.mime_type.clone().unwrap_or_default();
    let extension = extension_for(&mime_type).ok_or_else(|| {
        ServiceError::invalid(
            ErrorCode::InvalidFileType,
            "Invalid file type. Only audio files are allowed.",
        )
    })?;

    let debate_id = parse_id(raw_debate_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    require_debate(&store, debate_id).await?;

    let entity = persist_upload(
        state,
        &store,
        debate_id,
        metadata,
        &audio.bytes,
        mime_type,
        extension,
    )
    .await?;
    info!(
        %debate_id,
        recording_id = %entity.id,
        team = %entity.team,
        round_type = %entity.round_type,
        duration = entity.duration,
        file_name = audio.file_name.as_deref().unwrap_or("-"),
        size = audio.bytes.len(),
        "recording uploaded"
    );
    Ok(entity.into())
}

/// Write the audio then insert its row. The file is removed again when the row is refused.
async fn persist_upload(
    state: &SharedState,
    store: &Arc<dyn DebateStore>,
    debate_id: Uuid,
    metadata: UploadMetadata,
    bytes: &[u8],
    mime_type: String,
    extension: &str,
) -> Result<RecordingEntity, ServiceError> {
    let recording_id = Uuid::new_v4();
    let file_path = state
        .audio()
        .save(debate_id, recording_id, extension, bytes)
        .await?;
    let entity = RecordingEntity {
        id: recording_id,
        debate_id,
        team: metadata.team,
        round_type: metadata.round_type,
        order: metadata.order,
        duration: metadata.duration,
        file_path: Some(file_path.clone()),
        mime_type: Some(mime_type),
        transcription: None,
        created_at: OffsetDateTime::now_utc(),
    };
    let failure = match store.add_recording(entity.clone()).await {
        Ok(true) => return Ok(entity),
        Ok(false) => debate_not_found(debate_id),
        Err(err) => err.into(),
    };
    if let Err(err) = state.audio().remove(&file_path).await {
        warn!(%recording_id, path = %file_path, error = %err, "orphaned audio file left behind");
    }
    Err(failure)
}

/// Recordings of a debate in round order.
pub async fn list_recordings(
    state: &SharedState,
    raw_debate_id: &str,
) -> Result<Vec<RecordingResponse>, ServiceError> {
    let debate_id = parse_id(raw_debate_id, ErrorCode::DebateNotFound, "Debate")?;
    let store = state.require_debate_store().await?;
    require_debate(&store, debate_id).await?;
    let recordings = store.list_recordings(debate_id).await?;
    Ok(recordings.into_iter().map(Into::into).collect())
}

async fn require_recording(
    state: &SharedState,
    raw_id: &str,
) -> Result<RecordingEntity, ServiceError> {
    let id = parse_id(raw_id, ErrorCode::RecordingNotFound, "Recording")?;
    let store = state.require_debate_store().await?;
    store
        .find_recording(id)
        .await?
        .ok_or_else(|| recording_not_found(id))
}

pub(crate) fn recording_not_found(id: impl std::fmt::Display) -> ServiceError {
    ServiceError::not_found(ErrorCode::RecordingNotFound, format!("Recording {id} not found"))
}

/// One recording by id.
pub async fn get_recording(
    state: &SharedState,
    raw_id: &str,
) -> Result<RecordingResponse, ServiceError> {
    Ok(require_recording(state, raw_id).await?.into())
}

/// Attach a transcription. An absent or empty transcription leaves the recording as is.
pub async fn update_recording(
    state: &SharedState,
    raw_id: &str,
    request: UpdateRecordingRequest,
) -> Result<RecordingResponse, ServiceError> {
    request.validate()?;
    let mut recording = require_recording(state, raw_id).await?;

    if let Some(transcription) = request.transcription.filter(|text| !text.is_empty()) {
        let store = state.require_debate_store().await?;
        if !store
            .update_transcription(recording.id, transcription.clone())
            .await?
        {
            return Err(recording_not_found(recording.id));
        }
        info!(recording_id = %recording.id, "recording transcription updated");
        recording.transcription = Some(transcription);
    }
    Ok(recording.into())
}

/// Stored audio bytes with their MIME type.
pub async fn read_audio(
    state: &SharedState,
    raw_id: &str,
) -> Result<(String, Vec<u8>), ServiceError> {
    let recording = require_recording(state, raw_id).await?;
    let audio_missing = || {
        ServiceError::not_found(
            ErrorCode::AudioNotFound,
            format!("Audio for recording {} not found", recording.id),
        )
    };
    let Some(path) = recording.file_path.as_deref() else {
        return Err(audio_missing());
    };
    match state.audio().read(path).await? {
        Some(bytes) => {
            let mime = recording
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".into());
            Ok((mime, bytes))
        }
        None => {
            warn!(recording_id = %recording.id, %path, "audio file missing from upload directory");
            Err(audio_missing())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            debate_store::memory::MemoryDebateStore,
            models::{
                DebateAggregate, DebateEntity, DebateStatus, EvaluationEntity, TeamTotalsEntity,
            },
            storage::{StorageError, StorageResult},
        },
        state::AppState,
    };

    /// Store that refuses every recording insert, either as a missing debate or as an outage.
    struct RefusingStore {
        inner: MemoryDebateStore,
        offline: bool,
    }

    impl DebateStore for RefusingStore {
        fn create_debate(&self, debate: DebateEntity) -> BoxFuture<'static, StorageResult<DebateEntity>> {
            self.inner.create_debate(debate)
        }
        fn find_debate(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DebateAggregate>>> {
            self.inner.find_debate(id)
        }
        fn list_debates(&self) -> BoxFuture<'static, StorageResult<Vec<DebateAggregate>>> {
            self.inner.list_debates()
        }
        fn update_status(
            &self,
            id: Uuid,
            status: DebateStatus,
            at: OffsetDateTime,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.update_status(id, status, at)
        }
        fn add_recording(&self, _recording: RecordingEntity) -> BoxFuture<'static, StorageResult<bool>> {
            let offline = self.offline;
            Box::pin(async move {
                if offline {
                    Err(StorageError::unavailable(
                        "insert failed".into(),
                        io::Error::from(io::ErrorKind::ConnectionReset),
                    ))
                } else {
                    Ok(false)
                }
            })
        }
        fn list_recordings(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RecordingEntity>>> {
            self.inner.list_recordings(debate_id)
        }
        fn find_recording(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RecordingEntity>>> {
            self.inner.find_recording(id)
        }
        fn update_transcription(
            &self,
            id: Uuid,
            transcription: String,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.update_transcription(id, transcription)
        }
        fn add_evaluation(&self, evaluation: EvaluationEntity) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.add_evaluation(evaluation)
        }
        fn list_evaluations(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EvaluationEntity>>> {
            self.inner.list_evaluations(debate_id)
        }
        fn team_totals(&self, debate_id: Uuid) -> BoxFuture<'static, StorageResult<TeamTotalsEntity>> {
            self.inner.team_totals(debate_id)
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    #[tokio::test]
    async fn refused_insert_removes_the_written_audio() {
        for offline in [false, true] {
            let root = std::env::temp_dir().join(format!("ciceron-refused-{}", Uuid::new_v4()));
            let state = AppState::new(AppConfig {
                upload_dir: root.clone(),
                ..AppConfig::default()
            });
            let store: Arc<dyn DebateStore> = Arc::new(RefusingStore {
                inner: MemoryDebateStore::new(),
                offline,
            });
            let debate_id = Uuid::new_v4();
            let metadata = UploadMetadata {
                team: Team::A,
                round_type: RoundType::Introduccion,
                order: 1,
                duration: 180,
            };

            let err = persist_upload(
                &state,
                &store,
                debate_id,
                metadata,
                b"OggS",
                "audio/ogg".into(),
                "ogg",
            )
            .await
            .unwrap_err();
            match (offline, err) {
                (false, ServiceError::NotFound { code, .. }) => {
                    assert_eq!(code, ErrorCode::DebateNotFound)
                }
                (true, ServiceError::Unavailable(_)) => {}
                (_, other) => panic!("unexpected error {other:?}"),
            }

            let left = std::fs::read_dir(root.join(debate_id.to_string()))
                .unwrap()
                .count();
            assert_eq!(left, 0, "offline={offline}");
            let _ = std::fs::remove_dir_all(root);
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn code_of(err: ServiceError) -> ErrorCode {
        match err {
            ServiceError::InvalidInput { code, .. } => code,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn metadata_is_parsed_and_duration_rounded() {
        let metadata = parse_metadata(&fields(&[
            ("team", "B"),
            ("roundType", "Primer Refutador"),
            ("order", "4"),
            ("duration", "239.6"),
        ]))
        .unwrap();
        assert_eq!(
            metadata,
            UploadMetadata {
                team: Team::B,
                round_type: RoundType::PrimerRefutador,
                order: 4,
                duration: 240,
            }
        );
    }

    #[test]
    fn missing_field_comes_before_team_check() {
        let err = parse_metadata(&fields(&[("team", "C"), ("roundType", "Introducción")]))
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidInput);
    }

    #[test]
    fn team_must_be_a_or_b() {
        let err = parse_metadata(&fields(&[
            ("team", "C"),
            ("roundType", "Introducción"),
            ("order", "1"),
            ("duration", "180"),
        ]))
        .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidTeam);
    }

    #[test]
    fn bad_numbers_are_invalid_input() {
        for (order, duration) in [("0", "180"), ("x", "180"), ("1", "-3"), ("1", "NaN")] {
            let err = parse_metadata(&fields(&[
                ("team", "A"),
                ("roundType", "introduccion"),
                ("order", order),
                ("duration", duration),
            ]))
            .unwrap_err();
            assert_eq!(code_of(err), ErrorCode::InvalidInput, "{order}/{duration}");
        }
    }

    #[test]
    fn unknown_round_type_is_reported() {
        let err = parse_metadata(&fields(&[
            ("team", "A"),
            ("roundType", "Réplica"),
            ("order", "1"),
            ("duration", "60"),
        ]))
        .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidRoundType);
    }
}
