//! Error types shared by services and the HTTP layer.

use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    dto::envelope::ApiResponse,
    state::{scoring::ScoringError, state_machine::TransitionError},
};

/// Stable machine-readable error codes carried in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing request data.
    InvalidInput,
    /// Status is not active, completed or archived.
    InvalidStatus,
    /// Team is not `A` or `B`.
    InvalidTeam,
    /// Evaluation score outside `0..=100`.
    InvalidScore,
    /// Unknown round type name.
    InvalidRoundType,
    /// Format is not `UPCT` or `RETOR`.
    InvalidFormat,
    /// Criterion id not in the rubric.
    UnknownCriterion,
    /// Upload carried no audio part.
    NoFile,
    /// Audio MIME type not accepted.
    InvalidFileType,
    /// Upload over the size limit.
    FileTooLarge,
    /// No such debate.
    DebateNotFound,
    /// No such recording, or not in this debate.
    RecordingNotFound,
    /// No evaluation for the recording.
    EvaluationNotFound,
    /// Recording has no stored audio.
    AudioNotFound,
    /// Debate has no live session.
    LiveSessionNotFound,
    /// Debate already has a live session.
    LiveSessionExists,
    /// Action not legal in the current phase.
    InvalidTransition,
    /// Requested team has no later turn.
    NoTurnAhead,
    /// No route matches the path.
    RouteNotFound,
    /// Running without storage.
    StorageUnavailable,
    /// Operation took too long.
    Timeout,
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed while serving the request.
    #[error("storage failure")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("{message}")]
    InvalidInput {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Uploaded payload exceeds the configured limit.
    #[error("{0}")]
    TooLarge(String),
    /// Operation cannot be performed in the current state.
    #[error("{message}")]
    InvalidState {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Requested resource was not found.
    #[error("{message}")]
    NotFound {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl ServiceError {
    /// Client error with `code`, answered as 400.
    pub fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError::InvalidInput {
            code,
            message: message.into(),
        }
    }

    /// Missing resource with `code`, answered as 404.
    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError::NotFound {
            code,
            message: message.into(),
        }
    }

    /// State conflict with `code`, answered as 409.
    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError::InvalidState {
            code,
            message: message.into(),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        let code = match err {
            TransitionError::Illegal(_) => ErrorCode::InvalidTransition,
            TransitionError::NoTurnAhead(_) => ErrorCode::NoTurnAhead,
        };
        ServiceError::conflict(code, err.to_string())
    }
}

impl From<ScoringError> for ServiceError {
    fn from(err: ScoringError) -> Self {
        ServiceError::invalid(ErrorCode::UnknownCriterion, err.to_string())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::invalid(ErrorCode::InvalidInput, format!("validation failed: {err}"))
    }
}

impl From<MultipartError> for ServiceError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ServiceError::TooLarge("File too large".into());
        }
        ServiceError::invalid(ErrorCode::InvalidInput, err.body_text())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{message}")]
    BadRequest {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Requested resource not found.
    #[error("{message}")]
    NotFound {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Conflict with current state.
    #[error("{message}")]
    Conflict {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Request body over the upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),
    /// Service unavailable or degraded.
    #[error("{message}")]
    ServiceUnavailable {
        /// Stable error code.
        code: ErrorCode,
        /// Human readable reason.
        message: String,
    },
    /// Internal server error; the detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 404 for paths no route matches.
    pub fn route_not_found() -> Self {
        AppError::NotFound {
            code: ErrorCode::RouteNotFound,
            message: "Route not found".into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::Internal(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable {
                code: ErrorCode::StorageUnavailable,
                message: "storage unavailable (degraded mode)".into(),
            },
            ServiceError::InvalidInput { code, message } => AppError::BadRequest { code, message },
            ServiceError::TooLarge(message) => AppError::PayloadTooLarge(message),
            ServiceError::InvalidState { code, message } => AppError::Conflict { code, message },
            ServiceError::NotFound { code, message } => AppError::NotFound { code, message },
            ServiceError::Timeout => AppError::ServiceUnavailable {
                code: ErrorCode::Timeout,
                message: "operation timed out".into(),
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            code: ErrorCode::InvalidInput,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            AppError::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, Some(*code)),
            AppError::NotFound { code, .. } => (StatusCode::NOT_FOUND, Some(*code)),
            AppError::Conflict { code, .. } => (StatusCode::CONFLICT, Some(*code)),
            AppError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, Some(ErrorCode::FileTooLarge))
            }
            AppError::ServiceUnavailable { code, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, Some(*code))
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let message = match &self {
            AppError::Internal(detail) => {
                error!(error = %detail, "request failed with internal error");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(message, code))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::state::{
        rounds::Team,
        state_machine::{DebatePhase, InvalidTransition, SessionAction},
    };

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn storage_failures_are_not_leaked() {
        let storage = StorageError::Corrupt("row 42 has team `Z`".into());
        let (status, body) = body_json(ServiceError::from(storage).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("code").is_none());
    }

    #[tokio::test]
    async fn typed_errors_carry_code() {
        let err = ServiceError::invalid(ErrorCode::InvalidScore, "Score must be between 0 and 100");
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_SCORE");
        assert_eq!(body["error"], "Score must be between 0 and 100");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn transition_errors_are_conflicts() {
        let illegal: ServiceError = TransitionError::Illegal(InvalidTransition {
            from: DebatePhase::Setup,
            action: SessionAction::Pause,
        })
        .into();
        let (status, body) = body_json(illegal.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_TRANSITION");

        let (_, body) = body_json(ServiceError::from(TransitionError::NoTurnAhead(Team::B)).into()).await;
        assert_eq!(body["code"], "NO_TURN_AHEAD");
    }

    #[tokio::test]
    async fn degraded_mode_is_service_unavailable() {
        let (status, body) = body_json(ServiceError::Degraded.into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "STORAGE_UNAVAILABLE");
    }
}
