//! Mapping from [`AppError`] to HTTP responses.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::error::AppError;

/// Shown for every 503, whatever failed underneath.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable. Please try again later.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

fn error_body(message: impl Into<String>) -> Json<BTreeMap<&'static str, String>> {
  Json(BTreeMap::from([("error", message.into())]))
}

impl AppError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    let message = self.to_string();
    match self {
      AppError::NotFound(_) => {
        warn!(error = %message, "Not found");
        (status, error_body(message)).into_response()
      }
      AppError::ServiceUnavailable { source, .. } => {
        match &source {
          Some(source) => error!(%message, error = %source, "Directory service unavailable"),
          None => error!(%message, "Directory service unavailable"),
        }
        (status, error_body(UNAVAILABLE_MESSAGE)).into_response()
      }
      AppError::Validation(fields) => {
        warn!(?fields, "Rejected request");
        (status, Json(fields)).into_response()
      }
      AppError::Unexpected(detail) => {
        error!(%detail, "Unexpected error");
        (status, error_body(UNEXPECTED_MESSAGE)).into_response()
      }
    }
  }
}
