//! Wire types of the REST API.

/// Debate payloads.
pub mod debate;
/// Response envelope.
pub mod envelope;
/// Evaluation payloads.
pub mod evaluation;
/// JSON extractor with typed rejections.
pub mod extract;
/// Health payload.
pub mod health;
/// Live session payloads.
pub mod live;
/// Recording payloads.
pub mod recording;
/// Rubric and score sheet payloads.
pub mod rubric;
/// Shared validators.
pub mod validation;
