//! DTO definitions for recording uploads and metadata.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::RecordingEntity,
    state::rounds::{RoundType, Team},
};

/// Multipart form accepted by `POST /debates/{debateId}/recordings`. Documentation only;
/// the handler reads the parts directly.
#[derive(Debug, ToSchema)]
pub struct UploadRecordingForm {
    /// Audio file (`audio/mpeg`, `audio/wav`, `audio/webm` or `audio/ogg`).
    #[schema(value_type = String, format = Binary)]
    pub audio: Vec<u8>,
    /// `A` or `B`.
    pub team: String,
    /// Round type display name or alias.
    pub round_type: String,
    /// 1-based round position.
    pub order: i32,
    /// Length in seconds; fractional values are rounded.
    pub duration: f64,
}

/// Recording metadata as returned to clients.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResponse {
    /// Recording identifier.
    pub id: Uuid,
    /// Owning debate.
    pub debate_id: Uuid,
    /// Speaking team.
    pub team: Team,
    /// Round of the turn.
    pub round_type: RoundType,
    /// 1-based round position.
    pub order: i32,
    /// Upload time.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
    /// Whole seconds.
    pub duration: i32,
    /// Download location of the audio, when a file was stored.
    pub file_url: Option<String>,
    /// MIME type of the stored audio.
    pub mime_type: Option<String>,
    /// Attached transcription, if any.
    pub transcription: Option<String>,
}

impl From<RecordingEntity> for RecordingResponse {
    fn from(entity: RecordingEntity) -> Self {
        let file_url = entity
            .file_path
            .as_ref()
            .map(|_| format!("/api/recordings/{}/audio", entity.id));
        Self {
            id: entity.id,
            debate_id: entity.debate_id,
            team: entity.team,
            round_type: entity.round_type,
            order: entity.order,
            timestamp: entity.created_at,
            duration: entity.duration,
            file_url,
            mime_type: entity.mime_type,
            transcription: entity.transcription,
        }
    }
}

/// Body of `PATCH /recordings/{recordingId}`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateRecordingRequest {
    /// New transcription; absent or empty leaves the recording unchanged.
    #[validate(length(max = 200000))]
    pub transcription: Option<String>,
}
