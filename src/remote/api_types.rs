//! Serde types matching the remote service's request and response bodies.
//!
//! These are kept apart from the domain types so the envelope and input
//! shapes can change without touching the cached model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response envelope wrapped around every remote payload.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
  pub data: Option<T>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub error: Option<String>,
}

/// Youngest age the directory accepts.
pub const MIN_AGE: i64 = 16;
/// Oldest age the directory accepts.
pub const MAX_AGE: i64 = 75;

/// Body for `POST /employee`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmployeeInput {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub salary: Option<i64>,
  #[serde(default)]
  pub age: Option<i64>,
  #[serde(default)]
  pub title: String,
}

impl CreateEmployeeInput {
  /// Check every field, returning all violations keyed by field name.
  pub fn validate(&self) -> Result<(), BTreeMap<String, String>> {
    let mut errors = BTreeMap::new();

    if self.name.trim().is_empty() {
      errors.insert(
        "name".to_string(),
        "Name is required and cannot be blank".to_string(),
      );
    }

    match self.salary {
      None => {
        errors.insert("salary".to_string(), "Salary is required".to_string());
      }
      Some(s) if s <= 0 => {
        errors.insert(
          "salary".to_string(),
          "Salary must be greater than zero".to_string(),
        );
      }
      Some(_) => {}
    }

    match self.age {
      None => {
        errors.insert("age".to_string(), "Age is required".to_string());
      }
      Some(a) if a < MIN_AGE => {
        errors.insert(
          "age".to_string(),
          format!("Age must be at least {}", MIN_AGE),
        );
      }
      Some(a) if a > MAX_AGE => {
        errors.insert("age".to_string(), format!("Age must be at most {}", MAX_AGE));
      }
      Some(_) => {}
    }

    if self.title.trim().is_empty() {
      errors.insert(
        "title".to_string(),
        "Title is required and cannot be blank".to_string(),
      );
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(errors)
    }
  }
}

/// Body for `DELETE /employee`. The remote deletes by name, not id.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteEmployeeRequest<'a> {
  pub name: &'a str,
}
