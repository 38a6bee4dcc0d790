//! Scripted stand-in for the directory service, shared by unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::remote::api_types::CreateEmployeeInput;
use crate::remote::types::Employee;
use crate::remote::{EmployeeApi, RemoteError};

pub fn employee(id: &str, name: &str, salary: u32) -> Employee {
  Employee {
    id: id.to_string(),
    name: name.to_string(),
    salary,
    age: Some(30),
    title: Some("Engineer".to_string()),
    email: Some(format!("{}@company.test", id)),
  }
}

/// John Doe 75000, Jane Smith 85000, Bob Johnson 55000.
pub fn sample_employees() -> Vec<Employee> {
  vec![
    employee("1", "John Doe", 75_000),
    employee("2", "Jane Smith", 85_000),
    employee("3", "Bob Johnson", 55_000),
  ]
}

/// In-memory directory with call counters and injectable failures.
#[derive(Default)]
pub struct FakeApi {
  employees: Mutex<Vec<Employee>>,
  fetch_failure: Mutex<Option<RemoteError>>,
  write_failure: Mutex<Option<RemoteError>>,
  latency: Duration,
  fetch_calls: AtomicU32,
  create_calls: AtomicU32,
  delete_calls: AtomicU32,
  next_id: AtomicU32,
}

impl FakeApi {
  pub fn new(employees: Vec<Employee>) -> Self {
    Self {
      employees: Mutex::new(employees),
      next_id: AtomicU32::new(1000),
      ..Default::default()
    }
  }

  /// Every fetch sleeps this long before answering.
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub fn set_employees(&self, employees: Vec<Employee>) {
    *self.employees.lock().unwrap() = employees;
  }

  pub fn fail_fetches_with(&self, failure: Option<RemoteError>) {
    *self.fetch_failure.lock().unwrap() = failure;
  }

  pub fn fail_writes_with(&self, failure: Option<RemoteError>) {
    *self.write_failure.lock().unwrap() = failure;
  }

  pub fn fetch_count(&self) -> u32 {
    self.fetch_calls.load(Ordering::SeqCst)
  }

  pub fn create_count(&self) -> u32 {
    self.create_calls.load(Ordering::SeqCst)
  }

  pub fn delete_count(&self) -> u32 {
    self.delete_calls.load(Ordering::SeqCst)
  }

  pub fn remote_names(&self) -> Vec<String> {
    self
      .employees
      .lock()
      .unwrap()
      .iter()
      .map(|e| e.name.clone())
      .collect()
  }
}

impl EmployeeApi for FakeApi {
  async fn fetch_all(&self) -> Result<Vec<Employee>, RemoteError> {
    self.fetch_calls.fetch_add(1, Ordering::SeqCst);
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }

    let failure = self.fetch_failure.lock().unwrap().clone();
    match failure {
      Some(err) => Err(err),
      None => Ok(self.employees.lock().unwrap().clone()),
    }
  }

  async fn create(&self, input: &CreateEmployeeInput) -> Result<Employee, RemoteError> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);

    let failure = self.write_failure.lock().unwrap().clone();
    if let Some(err) = failure {
      return Err(err);
    }

    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
    let created = Employee {
      id: id.to_string(),
      name: input.name.clone(),
      salary: input.salary.unwrap_or_default() as u32,
      age: input.age.map(|a| a as u32),
      title: Some(input.title.clone()),
      email: None,
    };
    self.employees.lock().unwrap().push(created.clone());
    Ok(created)
  }

  async fn delete_by_name(&self, name: &str) -> Result<bool, RemoteError> {
    self.delete_calls.fetch_add(1, Ordering::SeqCst);

    let failure = self.write_failure.lock().unwrap().clone();
    if let Some(err) = failure {
      return Err(err);
    }

    let mut employees = self.employees.lock().unwrap();
    let before = employees.len();
    employees.retain(|e| e.name != name);
    Ok(employees.len() != before)
  }
}
