use std::{sync::Arc, time::Duration};

use reqwest::{
    Client, Method, RequestBuilder,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::DebateStatus,
    dto::{
        debate::{DebateConfigInput, DebateResponse, ResultsResponse},
        envelope::ApiResponse,
        evaluation::{CreateEvaluationRequest, EvaluationResponse, TeamEvaluationsResponse},
        health::HealthResponse,
        live::{LiveSessionResponse, action_path},
        recording::RecordingResponse,
        rubric::{RubricResponse, ScoreSheetRequest, ScoreSheetResponse},
    },
    state::{
        rounds::{FormatVariant, RoundType, Team},
        state_machine::SessionAction,
    },
};

use super::error::{ClientError, ClientResult};

/// Timeout applied to every request unless [`ApiClient::with_timeout`] overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One round's audio and metadata, as sent to the upload endpoint.
#[derive(Debug, Clone)]
pub struct RecordingUpload {
    /// Speaking team.
    pub team: Team,
    /// Round of the turn.
    pub round_type: RoundType,
    /// 1-based round position.
    pub order: u32,
    /// Length in seconds; the server rounds it.
    pub duration: f64,
    /// File name sent with the audio part.
    pub file_name: String,
    /// MIME type of the audio.
    pub mime_type: String,
    /// Raw audio.
    pub bytes: Vec<u8>,
}

/// Typed client for the debate API. Requests are never retried.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
}

impl ApiClient {
    /// Client for the API mounted at `base_url` (for example `http://localhost:5000/api`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Client whose requests fail once `timeout` elapses.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::ClientBuilder { source })?;
        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    async fn send<T>(&self, path: &str, builder: RequestBuilder) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::RequestSend {
                path: path.to_owned(),
                source,
            })?;
        let status = response.status();
        debug!(path, %status, "api response");

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let (code, message) =
                match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body) {
                    Ok(envelope) => (
                        envelope.code,
                        envelope.error.unwrap_or_else(|| status.to_string()),
                    ),
                    Err(_) => (None, String::from_utf8_lossy(&body).into_owned()),
                };
            return Err(ClientError::Api {
                path: path.to_owned(),
                status,
                code,
                message,
            });
        }

        let envelope = response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|source| ClientError::DecodeResponse {
                path: path.to_owned(),
                source,
            })?;
        envelope.data.ok_or_else(|| ClientError::MissingData {
            path: path.to_owned(),
        })
    }

    async fn get<T>(&self, path: &str) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::GET, path)).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.request(method, path).json(body)).await
    }

    /// Service health.
    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.get("/health").await
    }

    /// Create a debate from its configuration.
    pub async fn create_debate(&self, config: &DebateConfigInput) -> ClientResult<DebateResponse> {
        self.send_json(Method::POST, "/debates", &json!({ "config": config }))
            .await
    }

    /// Every debate, newest first.
    pub async fn list_debates(&self) -> ClientResult<Vec<DebateResponse>> {
        self.get("/debates").await
    }

    /// One debate with recordings and evaluations.
    pub async fn get_debate(&self, debate_id: Uuid) -> ClientResult<DebateResponse> {
        self.get(&format!("/debates/{debate_id}")).await
    }

    /// Set a debate's status.
    pub async fn update_status(
        &self,
        debate_id: Uuid,
        status: DebateStatus,
    ) -> ClientResult<DebateResponse> {
        let path = format!("/debates/{debate_id}/status");
        self.send_json(Method::PATCH, &path, &json!({ "status": status }))
            .await
    }

    /// Totals and winner of a debate.
    pub async fn results(&self, debate_id: Uuid) -> ClientResult<ResultsResponse> {
        self.get(&format!("/debates/{debate_id}/results")).await
    }

    /// Upload one round's audio as `multipart/form-data`.
    pub async fn upload_recording(
        &self,
        debate_id: Uuid,
        upload: RecordingUpload,
    ) -> ClientResult<RecordingResponse> {
        let mime_type = upload.mime_type;
        let audio = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&mime_type)
            .map_err(|source| ClientError::InvalidMime {
                mime_type: mime_type.clone(),
                source,
            })?;
        let form = Form::new()
            .text("team", upload.team.as_str())
            .text("roundType", upload.round_type.as_str())
            .text("order", upload.order.to_string())
            .text("duration", upload.duration.to_string())
            .part("audio", audio);

        let path = format!("/debates/{debate_id}/recordings");
        self.send(&path, self.request(Method::POST, &path).multipart(form))
            .await
    }

    /// Recordings of a debate.
    pub async fn list_recordings(&self, debate_id: Uuid) -> ClientResult<Vec<RecordingResponse>> {
        self.get(&format!("/debates/{debate_id}/recordings")).await
    }

    /// Recording metadata.
    pub async fn get_recording(&self, recording_id: Uuid) -> ClientResult<RecordingResponse> {
        self.get(&format!("/recordings/{recording_id}")).await
    }

    /// Attach a transcription to a recording.
    pub async fn update_transcription(
        &self,
        recording_id: Uuid,
        transcription: &str,
    ) -> ClientResult<RecordingResponse> {
        let path = format!("/recordings/{recording_id}");
        self.send_json(
            Method::PATCH,
            &path,
            &json!({ "transcription": transcription }),
        )
        .await
    }

    /// Raw audio bytes of a recording.
    pub async fn download_audio(&self, recording_id: Uuid) -> ClientResult<Vec<u8>> {
        let path = format!("/recordings/{recording_id}/audio");
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ClientError::RequestSend {
                path: path.clone(),
                source,
            })?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::DecodeResponse { path, source })?;
        Ok(bytes.to_vec())
    }

    /// Submit an evaluation for a debate.
    pub async fn create_evaluation(
        &self,
        debate_id: Uuid,
        request: &CreateEvaluationRequest,
    ) -> ClientResult<EvaluationResponse> {
        let path = format!("/debates/{debate_id}/evaluations");
        self.send_json(Method::POST, &path, request).await
    }

    /// Evaluations of a debate.
    pub async fn list_evaluations(&self, debate_id: Uuid) -> ClientResult<Vec<EvaluationResponse>> {
        self.get(&format!("/debates/{debate_id}/evaluations")).await
    }

    /// Evaluation of one recording.
    pub async fn recording_evaluation(
        &self,
        debate_id: Uuid,
        recording_id: Uuid,
    ) -> ClientResult<EvaluationResponse> {
        self.get(&format!("/debates/{debate_id}/evaluations/{recording_id}"))
            .await
    }

    /// One team's evaluations and aggregates.
    pub async fn team_evaluations(
        &self,
        debate_id: Uuid,
        team: Team,
    ) -> ClientResult<TeamEvaluationsResponse> {
        self.get(&format!("/debates/{debate_id}/teams/{team}/evaluations"))
            .await
    }

    /// Rubric of a format.
    pub async fn rubric(&self, format: FormatVariant) -> ClientResult<RubricResponse> {
        self.get(&format!("/rubrics/{}", format.as_str())).await
    }

    /// Score a judge's sheet against the rubric of `format`.
    pub async fn score_sheet(
        &self,
        format: FormatVariant,
        sheet: &ScoreSheetRequest,
    ) -> ClientResult<ScoreSheetResponse> {
        let path = format!("/rubrics/{}/score", format.as_str());
        self.send_json(Method::POST, &path, sheet).await
    }

    /// Open a live session in setup for the debate.
    pub async fn open_live(&self, debate_id: Uuid) -> ClientResult<LiveSessionResponse> {
        let path = format!("/debates/{debate_id}/live");
        self.send(&path, self.request(Method::POST, &path)).await
    }

    /// Current live snapshot of a debate.
    pub async fn live_session(&self, debate_id: Uuid) -> ClientResult<LiveSessionResponse> {
        self.get(&format!("/debates/{debate_id}/live")).await
    }

    /// Request a transition of the live session.
    pub async fn live_action(
        &self,
        debate_id: Uuid,
        action: SessionAction,
    ) -> ClientResult<LiveSessionResponse> {
        let path = format!("/debates/{debate_id}/live/{}", action_path(action));
        self.send(&path, self.request(Method::POST, &path)).await
    }

    /// Close the live session and return its final snapshot.
    pub async fn close_live(&self, debate_id: Uuid) -> ClientResult<LiveSessionResponse> {
        let path = format!("/debates/{debate_id}/live");
        self.send(&path, self.request(Method::DELETE, &path)).await
    }
}
