use color_eyre::{eyre::eyre, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::api_types::{ApiResponse, CreateEmployeeInput, DeleteEmployeeRequest};
use super::error::RemoteError;
use super::types::Employee;
use super::EmployeeApi;
use crate::config::RemoteConfig;

/// HTTP client for the directory service
#[derive(Clone)]
pub struct RemoteClient {
  http: Client,
  /// `{base_url}/employee`, the only resource the service exposes
  employees_url: Url,
}

impl RemoteClient {
  pub fn new(config: &RemoteConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid directory service URL {}: {}", config.base_url, e))?;

    let http = Client::builder()
      .connect_timeout(config.connect_timeout())
      .read_timeout(config.read_timeout())
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      employees_url: employees_url(base)?,
    })
  }

  pub fn employees_url(&self) -> &Url {
    &self.employees_url
  }
}

/// Append the `employee` segment, keeping any path already on the base.
fn employees_url(mut base: Url) -> Result<Url> {
  if !base.path().ends_with('/') {
    let path = format!("{}/", base.path());
    base.set_path(&path);
  }
  base
    .join("employee")
    .map_err(|e| eyre!("Invalid directory service URL {}: {}", base, e))
}

/// Unwrap the `{data, status, error}` envelope, turning non-success statuses
/// and missing payloads into errors.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
  let status = response.status();
  let body = response.text().await?;

  if !status.is_success() {
    return Err(RemoteError::from_status(status, body));
  }

  let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
  envelope.data.ok_or_else(|| {
    RemoteError::EmptyResponse(
      envelope
        .error
        .or(envelope.status)
        .unwrap_or_else(|| "response carried no data".to_string()),
    )
  })
}

impl EmployeeApi for RemoteClient {
  async fn fetch_all(&self) -> Result<Vec<Employee>, RemoteError> {
    debug!(url = %self.employees_url, "Fetching all employees");
    let response = self.http.get(self.employees_url.clone()).send().await?;
    read_envelope(response).await
  }

  async fn create(&self, input: &CreateEmployeeInput) -> Result<Employee, RemoteError> {
    debug!(name = %input.name, "Creating employee");
    let response = self
      .http
      .post(self.employees_url.clone())
      .json(input)
      .send()
      .await?;
    read_envelope(response).await
  }

  async fn delete_by_name(&self, name: &str) -> Result<bool, RemoteError> {
    debug!(name, "Deleting employee");
    let response = self
      .http
      .delete(self.employees_url.clone())
      .json(&DeleteEmployeeRequest { name })
      .send()
      .await?;
    read_envelope(response).await
  }
}
