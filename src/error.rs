//! Errors surfaced by the repository and service layers.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::cache::CacheError;
use crate::pagination::PaginationError;
use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum AppError {
  /// The id is not in the current snapshot, or the remote deleted nothing.
  #[error("Employee not found with ID: {0}")]
  NotFound(String),

  /// No data could be served, or a remote write failed.
  #[error("{message}")]
  ServiceUnavailable {
    message: String,
    #[source]
    source: Option<RemoteError>,
  },

  /// Field name to message, for every rejected field.
  #[error("Validation failed: {}", describe_fields(.0))]
  Validation(BTreeMap<String, String>),

  #[error("Unexpected error: {0}")]
  Unexpected(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

fn describe_fields(fields: &BTreeMap<String, String>) -> String {
  fields
    .iter()
    .map(|(field, message)| format!("{}: {}", field, message))
    .collect::<Vec<_>>()
    .join(", ")
}

impl AppError {
  pub fn unavailable(message: impl Into<String>, source: RemoteError) -> Self {
    AppError::ServiceUnavailable {
      message: message.into(),
      source: Some(source),
    }
  }

  /// Single-field validation failure.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    let mut fields = BTreeMap::new();
    fields.insert(field.to_string(), message.into());
    AppError::Validation(fields)
  }
}

impl From<CacheError> for AppError {
  fn from(err: CacheError) -> Self {
    match err {
      CacheError::Unavailable { entity, source } => AppError::ServiceUnavailable {
        message: format!("No {} data available", entity),
        source: Some(source),
      },
    }
  }
}

impl From<PaginationError> for AppError {
  fn from(err: PaginationError) -> Self {
    let field = match err {
      PaginationError::ZeroSize => "size",
      PaginationError::UnknownSortKey(_) | PaginationError::UnknownDirection(_) => "sort",
    };
    AppError::invalid(field, err.to_string())
  }
}
