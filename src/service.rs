//! Employee use cases: cached reads, salary aggregates and remote writes.
//!
//! Writes go straight to the directory service and never touch the
//! snapshot, so a created or deleted employee shows up in listings only
//! after the next refresh.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::CacheStatus;
use crate::error::{AppError, AppResult};
use crate::pagination::{PagedResult, PaginationRequest};
use crate::remote::api_types::CreateEmployeeInput;
use crate::remote::types::Employee;
use crate::remote::{EmployeeApi, RemoteError};
use crate::repository::EmployeeRepository;
use crate::retry::RetryPolicy;

/// How many names the top earners list holds.
pub const TOP_EARNERS: usize = 10;

pub struct EmployeeService<C: EmployeeApi> {
  repository: EmployeeRepository<C>,
  /// Applied to create and delete calls
  retry: RetryPolicy,
}

impl<C: EmployeeApi> EmployeeService<C> {
  pub fn new(repository: EmployeeRepository<C>, retry: RetryPolicy) -> Self {
    Self { repository, retry }
  }

  pub fn repository(&self) -> &EmployeeRepository<C> {
    &self.repository
  }

  pub async fn get_all_employees(&self) -> AppResult<Arc<[Employee]>> {
    self.repository.find_all().await
  }

  pub async fn get_employees_paged(
    &self,
    request: &PaginationRequest,
  ) -> AppResult<PagedResult<Employee>> {
    self.repository.find_all_paged(request).await
  }

  /// Every employee whose name contains `needle`, ignoring case.
  pub async fn search_by_name(&self, needle: &str) -> AppResult<Vec<Employee>> {
    let needle = needle.to_lowercase();
    let all = self.repository.find_all().await?;
    Ok(
      all
        .iter()
        .filter(|e| e.name_contains(&needle))
        .cloned()
        .collect(),
    )
  }

  pub async fn search_by_name_paged(
    &self,
    needle: &str,
    request: &PaginationRequest,
  ) -> AppResult<PagedResult<Employee>> {
    self
      .repository
      .find_by_name_containing(needle, request)
      .await
  }

  pub async fn get_employee_by_id(&self, id: &str) -> AppResult<Employee> {
    self.repository.find_by_id(id).await
  }

  /// Largest salary in the directory, or 0 when it is empty.
  pub async fn get_highest_salary(&self) -> AppResult<u32> {
    let all = self.repository.find_all().await?;
    Ok(all.iter().map(|e| e.salary).max().unwrap_or(0))
  }

  /// Names of the ten best paid employees, highest first. Equal salaries
  /// keep their directory order.
  pub async fn get_top_ten_highest_earning_names(&self) -> AppResult<Vec<String>> {
    let all = self.repository.find_all().await?;
    let mut ranked: Vec<&Employee> = all.iter().collect();
    ranked.sort_by(|a, b| b.salary.cmp(&a.salary));

    Ok(
      ranked
        .into_iter()
        .take(TOP_EARNERS)
        .map(|e| e.name.clone())
        .collect(),
    )
  }

  /// Validate and create an employee on the remote. The cached snapshot is
  /// left alone.
  pub async fn create_employee(&self, input: &CreateEmployeeInput) -> AppResult<Employee> {
    input.validate().map_err(AppError::Validation)?;

    let client = self.repository.client();
    let created = self
      .retry
      .execute(|| client.create(input), RemoteError::is_transient)
      .await
      .map_err(|e| {
        warn!(name = %input.name, error = %e, "Failed to create employee");
        AppError::unavailable("Failed to create employee", e)
      })?;

    info!(id = %created.id, name = %created.name, "Created employee");
    Ok(created)
  }

  /// Delete by id and return the deleted employee's name.
  ///
  /// The remote only deletes by name, so the id is resolved against the
  /// cached snapshot first. The snapshot itself is not updated.
  pub async fn delete_employee_by_id(&self, id: &str) -> AppResult<String> {
    let employee = self.repository.find_by_id(id).await?;
    let name = employee.name.as_str();

    let client = self.repository.client();
    let deleted = self
      .retry
      .execute(|| client.delete_by_name(name), RemoteError::is_transient)
      .await;

    match deleted {
      Ok(true) => {
        info!(id, name, "Deleted employee");
        Ok(employee.name)
      }
      Ok(false) => {
        warn!(id, name, "Directory service reported nothing deleted");
        Err(AppError::NotFound(id.to_string()))
      }
      Err(e) if e.is_not_found() => Err(AppError::NotFound(id.to_string())),
      Err(e) => {
        warn!(id, name, error = %e, "Failed to delete employee");
        Err(AppError::unavailable("Failed to delete employee", e))
      }
    }
  }

  pub async fn refresh(&self) -> AppResult<CacheStatus> {
    self.repository.refresh().await
  }

  pub async fn cache_status(&self) -> CacheStatus {
    self.repository.cache_status().await
  }
}
