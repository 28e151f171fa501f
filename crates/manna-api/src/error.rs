//! API error type and [`axum::response::IntoResponse`] implementation.

use std::error::Error as _;

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use manna_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or invalid bearer token")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

/// The error and every source beneath it, outermost first.
fn details(err: &dyn std::error::Error) -> String {
  let mut out = err.to_string();
  let mut next = err.source();
  while let Some(e) = next {
    out.push_str(": ");
    out.push_str(&e.to_string());
    next = e.source();
  }
  out
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized | ApiError::Core(CoreError::Unauthenticated) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) | ApiError::Core(CoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_)
      | ApiError::Core(CoreError::MissingFields(_) | CoreError::Invalid(_) | CoreError::InvalidColumn(_)) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Core(CoreError::Forbidden(_)) => StatusCode::FORBIDDEN,
      ApiError::Core(CoreError::Conflict(_) | CoreError::Contention { .. }) => StatusCode::CONFLICT,
      ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match &self {
      ApiError::Core(CoreError::MissingFields(missing)) => json!({
        "error": self.to_string(),
        "missing": missing,
      }),
      ApiError::Core(e) if status.is_server_error() => {
        tracing::error!(error = %details(e), "request failed");
        json!({
          "error": "internal error",
          "details": e.source().map(|s| details(s)).unwrap_or_else(|| e.to_string()),
        })
      }
      _ => json!({ "error": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
