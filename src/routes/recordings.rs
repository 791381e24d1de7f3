use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartRejection},
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{
    dto::{
        envelope::{ApiResult, CreatedResult, created, ok},
        extract::JsonBody,
        recording::{RecordingResponse, UpdateRecordingRequest, UploadRecordingForm},
    },
    error::{AppError, ErrorCode},
    services::recording_service,
    state::SharedState,
};

/// Room for the text parts of an upload on top of the audio limit.
const FORM_OVERHEAD: usize = 64 * 1024;

/// Routes for recording uploads and metadata. Uploads accept `max_file_size` bytes of audio.
pub fn router(max_file_size: usize) -> Router<SharedState> {
    Router::new()
        .route(
            "/debates/{debateId}/recordings",
            get(list_recordings)
                .post(upload_recording)
                .layer(DefaultBodyLimit::max(max_file_size.saturating_add(FORM_OVERHEAD))),
        )
        .route(
            "/recordings/{recordingId}",
            get(get_recording).patch(update_recording),
        )
        .route("/recordings/{recordingId}/audio", get(get_audio))
}

#[utoipa::path(
    post,
    path = "/debates/{debateId}/recordings",
    tag = "recordings",
    params(("debateId" = String, Path, description = "Debate identifier")),
    request_body(content = UploadRecordingForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Recording stored", body = RecordingResponse),
        (status = 400, description = "INVALID_INPUT, INVALID_TEAM, INVALID_ROUND_TYPE, NO_FILE or INVALID_FILE_TYPE"),
        (status = 404, description = "DEBATE_NOT_FOUND"),
        (status = 413, description = "FILE_TOO_LARGE")
    )
)]
/// Upload one round's audio with its metadata.
pub async fn upload_recording(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> CreatedResult<RecordingResponse> {
    let multipart = multipart.map_err(|rejection| AppError::BadRequest {
        code: ErrorCode::InvalidInput,
        message: rejection.body_text(),
    })?;
    Ok(created(
        recording_service::upload_recording(&state, &debate_id, multipart).await?,
    ))
}

/// Recordings of a debate in round order.
#[utoipa::path(
    get,
    path = "/debates/{debateId}/recordings",
    tag = "recordings",
    params(("debateId" = String, Path, description = "Debate identifier")),
    responses(
        (status = 200, description = "Recordings in round order", body = [RecordingResponse]),
        (status = 404, description = "DEBATE_NOT_FOUND")
    )
)]
pub async fn list_recordings(
    State(state): State<SharedState>,
    Path(debate_id): Path<String>,
) -> ApiResult<Vec<RecordingResponse>> {
    Ok(ok(
        recording_service::list_recordings(&state, &debate_id).await?,
    ))
}

/// Metadata of one recording.
#[utoipa::path(
    get,
    path = "/recordings/{recordingId}",
    tag = "recordings",
    params(("recordingId" = String, Path, description = "Recording identifier")),
    responses(
        (status = 200, description = "Recording metadata", body = RecordingResponse),
        (status = 404, description = "RECORDING_NOT_FOUND")
    )
)]
pub async fn get_recording(
    State(state): State<SharedState>,
    Path(recording_id): Path<String>,
) -> ApiResult<RecordingResponse> {
    Ok(ok(
        recording_service::get_recording(&state, &recording_id).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/recordings/{recordingId}",
    tag = "recordings",
    params(("recordingId" = String, Path, description = "Recording identifier")),
    request_body = UpdateRecordingRequest,
    responses(
        (status = 200, description = "Updated recording", body = RecordingResponse),
        (status = 404, description = "RECORDING_NOT_FOUND")
    )
)]
/// Attach a transcription to a recording.
pub async fn update_recording(
    State(state): State<SharedState>,
    Path(recording_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateRecordingRequest>,
) -> ApiResult<RecordingResponse> {
    Ok(ok(
        recording_service::update_recording(&state, &recording_id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/recordings/{recordingId}/audio",
    tag = "recordings",
    params(("recordingId" = String, Path, description = "Recording identifier")),
    responses(
        (status = 200, description = "Stored audio bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "RECORDING_NOT_FOUND or AUDIO_NOT_FOUND")
    )
)]
/// Stream the stored audio file back with its recorded MIME type.
pub async fn get_audio(
    State(state): State<SharedState>,
    Path(recording_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (mime, bytes) = recording_service::read_audio(&state, &recording_id).await?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes))
}
