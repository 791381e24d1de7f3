//! PostgreSQL backend built on a `sqlx` pool with embedded migrations.

mod error;
mod rows;
/// Pool setup and the [`DebateStore`](crate::dao::debate_store::DebateStore) impl.
pub mod store;

pub use error::PostgresDaoError;
pub use store::{PostgresConfig, PostgresDebateStore};

use crate::dao::storage::StorageError;

impl From<PostgresDaoError> for StorageError {
    fn from(err: PostgresDaoError) -> Self {
        match err {
            PostgresDaoError::Corrupt { .. } => StorageError::Corrupt(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
