//! Caching implementations for directory types.

use crate::cache::Cacheable;

use super::types::Employee;

impl Cacheable for Employee {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn entity_type() -> &'static str {
    "employee"
  }
}
