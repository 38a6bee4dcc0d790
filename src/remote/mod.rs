//! The remote directory service: wire types, errors and the HTTP client.

pub mod api_types;
mod cache;
pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

pub use client::RemoteClient;
pub use error::RemoteError;

use api_types::CreateEmployeeInput;
use types::Employee;

/// Operations offered by the directory service.
///
/// The service can only list everything at once; there is no paging or
/// lookup on the remote side.
pub trait EmployeeApi: Send + Sync + 'static {
  /// `GET /employee`
  fn fetch_all(&self) -> impl Future<Output = Result<Vec<Employee>, RemoteError>> + Send;

  /// `POST /employee`
  fn create(
    &self,
    input: &CreateEmployeeInput,
  ) -> impl Future<Output = Result<Employee, RemoteError>> + Send;

  /// `DELETE /employee`, keyed by name. Resolves to whether anything was deleted.
  fn delete_by_name(&self, name: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send;
}
