//! Request extractors.

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body extractor whose rejections render as `400 INVALID_INPUT` envelopes.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
