//! HTTP-facing error type, with its [`axum::response::IntoResponse`]
//! mapping to status codes and JSON bodies.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use minder_core::status::TicketStatus;
use serde_json::json;
use thiserror::Error;

/// What a status-API handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("cannot change status from {from} to {to}")]
  InvalidTransition {
    from: TicketStatus,
    to:   TicketStatus,
  },

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<minder_core::Error> for ApiError {
  fn from(error: minder_core::Error) -> Self {
    match error {
      minder_core::Error::UnknownStatus(raw) => {
        ApiError::BadRequest(format!("unknown status: {raw:?}"))
      }
      minder_core::Error::MissingField(field) => {
        ApiError::BadRequest(format!("missing field: {field}"))
      }
      minder_core::Error::InvalidTransition { from, to } => {
        ApiError::InvalidTransition { from, to }
      }
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, json!({ "error": m }))
      }
      ApiError::InvalidTransition { .. } => (
        StatusCode::BAD_REQUEST,
        json!({ "error": self.to_string(), "kind": "invalid_transition" }),
      ),
      // Store and notifier detail is logged by the engine; callers get a
      // generic body.
      ApiError::Internal(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "internal server error" }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
