//! Data access layer.

/// Disk storage for uploaded audio.
pub mod audio_files;
/// Debate persistence trait and its backends.
pub mod debate_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
