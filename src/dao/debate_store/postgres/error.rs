//! Errors raised by the PostgreSQL store.

use sqlx::migrate::MigrateError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for PostgreSQL store operations.
pub type PostgresResult<T> = std::result::Result<T, PostgresDaoError>;

/// Failures of the PostgreSQL store, each naming the operation that failed.
#[derive(Debug, Error)]
pub enum PostgresDaoError {
    /// The pool could not be opened.
    #[error("failed to connect to PostgreSQL")]
    Connect {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Embedded migrations failed to apply.
    #[error("failed to run database migrations")]
    Migrate {
        /// Driver error.
        #[source]
        source: MigrateError,
    },
    /// `SELECT 1` failed.
    #[error("PostgreSQL health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Inserting a debate failed.
    #[error("failed to save debate `{id}`")]
    SaveDebate {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Reading a debate or its children failed.
    #[error("failed to load debate `{id}`")]
    LoadDebate {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Listing debates failed.
    #[error("failed to list debates")]
    ListDebates {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Updating a debate status failed.
    #[error("failed to update debate `{id}`")]
    UpdateDebate {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Inserting a recording failed.
    #[error("failed to save recording `{id}`")]
    SaveRecording {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Reading recordings failed.
    #[error("failed to load recording `{id}`")]
    LoadRecording {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Updating a transcription failed.
    #[error("failed to update recording `{id}`")]
    UpdateRecording {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Inserting an evaluation failed.
    #[error("failed to save evaluation `{id}`")]
    SaveEvaluation {
        /// Row identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Reading evaluations failed.
    #[error("failed to load evaluations of debate `{debate_id}`")]
    LoadEvaluations {
        /// Debate the query ran for.
        debate_id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// The per-team totals query failed.
    #[error("failed to compute team totals of debate `{debate_id}`")]
    Totals {
        /// Debate the query ran for.
        debate_id: Uuid,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A stored row holds a value the domain types reject.
    #[error("row `{id}` in `{table}` is corrupt: {message}")]
    Corrupt {
        /// Table the row came from.
        table: &'static str,
        /// Row identifier.
        id: Uuid,
        /// What was wrong with it.
        message: String,
    },
}
