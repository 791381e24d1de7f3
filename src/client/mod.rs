//! HTTP client for the debate API and the local history of scored debates.

mod api;
mod error;
mod history;

pub use api::{ApiClient, DEFAULT_TIMEOUT, RecordingUpload};
pub use error::{ClientError, ClientResult, HistoryError};
pub use history::{DebateHistory, HistoryEntry};
