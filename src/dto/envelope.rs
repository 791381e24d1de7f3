//! Response envelope shared by every endpoint.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;

use crate::error::{AppError, ErrorCode};

/// `{success, data?, error?, code?, timestamp}` wrapper around every response body.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// `true` when `data` is set.
    pub success: bool,
    /// Payload of a successful call.
    pub data: Option<T>,
    /// Message of a failed call.
    pub error: Option<String>,
    /// Machine-readable code of a failed call.
    pub code: Option<ErrorCode>,
    /// When the response was produced.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Failed response with a human readable message and an optional stable code.
    pub fn failure(message: impl Into<String>, code: Option<ErrorCode>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Handler result for `200 OK` responses.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Handler result for `201 Created` responses.
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

/// Wrap `data` in a `200 OK` envelope.
pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Wrap `data` in a `201 Created` envelope.
pub fn created<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_error_fields() {
        let value = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert!(value.get("error").is_none());
        assert!(value.get("code").is_none());
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn failure_omits_data() {
        let value = serde_json::to_value(ApiResponse::<()>::failure(
            "Debate x not found",
            Some(ErrorCode::DebateNotFound),
        ))
        .unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["code"], "DEBATE_NOT_FOUND");
        assert!(value.get("data").is_none());
    }
}
