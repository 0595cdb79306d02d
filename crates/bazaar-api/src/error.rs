//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("event source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("aggregation task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Source(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Task(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    if status.is_server_error() {
      tracing::error!("{self}");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}
