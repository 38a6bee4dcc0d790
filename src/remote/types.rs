use serde::{Deserialize, Serialize};

/// A directory entry as published by the remote service.
///
/// Field names follow the remote wire format, which is also what the HTTP
/// surface returns to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id: String,
  #[serde(rename = "employee_name")]
  pub name: String,
  #[serde(rename = "employee_salary")]
  pub salary: u32,
  #[serde(rename = "employee_age", default)]
  pub age: Option<u32>,
  #[serde(rename = "employee_title", default)]
  pub title: Option<String>,
  #[serde(rename = "employee_email", default)]
  pub email: Option<String>,
}

impl Employee {
  /// Case-insensitive substring match on the name.
  pub fn name_contains(&self, needle_lower: &str) -> bool {
    self.name.to_lowercase().contains(needle_lower)
  }
}
