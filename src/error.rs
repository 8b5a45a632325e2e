//! Error taxonomy shared by generation, grading and the HTTP layer.
//!
//! Provider and malformed-response failures are server-side (500) and share
//! one client-facing message; the detail only goes to the logs.
//! Validation and unsupported-type failures are the caller's fault (400).

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;
use tracing::error;

use crate::protocol::ErrorOut;

pub const UPSTREAM_FAILURE_MESSAGE: &str =
  "The AI provider failed or returned an unusable response. Please try again.";

#[derive(Debug, Error)]
pub enum QuizError {
  /// The completion call itself failed (network, auth, quota, timeout).
  #[error("provider error: {0}")]
  Provider(String),
  /// The provider answered, but the text is not the JSON we asked for.
  #[error("malformed provider response: {0}")]
  MalformedResponse(String),
  /// The client payload is missing fields or is inconsistent.
  #[error("{0}")]
  Validation(String),
  #[error("unsupported question type: {0}")]
  UnsupportedType(String),
}

impl QuizError {
  pub fn status(&self) -> StatusCode {
    match self {
      QuizError::Provider(_) | QuizError::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
      QuizError::Validation(_) | QuizError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
    }
  }

  /// Message safe to hand back to the browser.
  pub fn public_message(&self) -> String {
    match self {
      QuizError::Provider(_) | QuizError::MalformedResponse(_) => UPSTREAM_FAILURE_MESSAGE.into(),
      other => other.to_string(),
    }
  }
}

impl From<serde_json::Error> for QuizError {
  fn from(e: serde_json::Error) -> Self {
    QuizError::MalformedResponse(format!("JSON parse error: {e}"))
  }
}

impl IntoResponse for QuizError {
  fn into_response(self) -> axum::response::Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "quizgen", error = %self, "Request failed upstream");
    }
    (status, Json(ErrorOut { error: self.public_message() })).into_response()
  }
}
