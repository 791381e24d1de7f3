/// Debate creation, lookup, status and results.
pub mod debate_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Evaluation storage and team aggregation.
pub mod evaluation_service;
/// Health check service.
pub mod health_service;
/// Live session lifecycle.
pub mod live_service;
/// Recording uploads, metadata and audio.
pub mod recording_service;
/// Rubric lookup and score sheets.
pub mod scoring_service;
/// Server-Sent Events stream of live snapshots.
pub mod sse_service;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
