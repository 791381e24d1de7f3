//! Error types shared by the HTTP client and the history file.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::error::ErrorCode;

/// Convenient result alias returning [`ClientError`] failures.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures that can occur while talking to the debate API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with an error envelope.
    #[error("request to `{path}` failed with status {status}: {message}")]
    Api {
        path: String,
        status: StatusCode,
        code: Option<ErrorCode>,
        message: String,
    },
    /// Response payload could not be parsed into the expected envelope.
    #[error("failed to decode response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A successful envelope arrived without `data`.
    #[error("response for `{path}` carried no data")]
    MissingData { path: String },
    /// An audio part could not be attached to the upload form.
    #[error("invalid MIME type `{mime_type}` for upload")]
    InvalidMime {
        mime_type: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Stable error code reported by the server, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => *code,
            _ => None,
        }
    }
}

/// Failures of the local debate history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading or writing the history file failed.
    #[error("failed to access history file `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serializing the history failed.
    #[error("failed to encode history")]
    Encode(#[source] serde_json::Error),
}
