//! Extractors whose rejections use the API error body.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path};

use crate::error::AppError;

/// `Json<T>` that rejects malformed or incomplete bodies with 400
/// `validation_error`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path<T>` that rejects unparsable segments with 400 `validation_error`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
