//! Error types: session transitions, sentence enrichment, and the HTTP mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

/// Rejected session transitions. None of these change session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
  #[error("quiz has no questions")]
  NoQuestions,
  #[error("quiz already completed")]
  Completed,
  #[error("current question has not been answered yet")]
  NotAnswered,
  #[error("'{0}' is not one of the current options")]
  NotAnOption(String),
}

/// Failures of the sentence-generation collaborator. The session maps all of
/// them to an unavailable enrichment.
#[derive(Debug, Error)]
pub enum EnrichmentError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("OpenAI HTTP {status}: {message}")]
  Status { status: reqwest::StatusCode, message: String },
  #[error("JSON parse error: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Errors surfaced by HTTP handlers as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unknown lesson: {0}")]
  UnknownLesson(String),
  #[error("unknown session: {0}")]
  UnknownSession(String),
  #[error("{0}")]
  BadRequest(String),
  #[error(transparent)]
  Session(#[from] SessionError),
}

#[derive(Serialize)]
struct ErrorOut {
  error: String,
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::UnknownLesson(_) | ApiError::UnknownSession(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) | ApiError::Session(SessionError::NotAnOption(_)) => StatusCode::BAD_REQUEST,
      ApiError::Session(_) => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    (self.status(), Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
