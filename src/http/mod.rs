//! JSON HTTP surface over [`EmployeeService`].

mod error;
mod routes;

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::config::PaginationConfig;
use crate::error::AppError;
use crate::remote::EmployeeApi;
use crate::service::EmployeeService;

/// Shared state handed to every handler.
pub struct ApiState<C: EmployeeApi> {
  pub service: Arc<EmployeeService<C>>,
  pub pagination: PaginationConfig,
}

// derive(Clone) would demand C: Clone
impl<C: EmployeeApi> Clone for ApiState<C> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
      pagination: self.pagination.clone(),
    }
  }
}

impl<C: EmployeeApi> ApiState<C> {
  pub fn new(service: Arc<EmployeeService<C>>, pagination: PaginationConfig) -> Self {
    Self {
      service,
      pagination,
    }
  }
}

pub fn router<C: EmployeeApi>(state: ApiState<C>) -> Router {
  Router::new()
    .route("/api/v1/employees", get(routes::list_employees::<C>))
    .route(
      "/api/v1/employees/search",
      get(routes::search_employees::<C>),
    )
    .route(
      "/api/v1/employees/refresh",
      post(routes::refresh_cache::<C>),
    )
    .route("/api/v1/employees/cache", get(routes::cache_status::<C>))
    .route(
      "/api/v1/employee",
      get(routes::redirect_all::<C>).post(routes::create_employee::<C>),
    )
    .route(
      "/api/v1/employee/search/:search_string",
      get(routes::redirect_search::<C>),
    )
    .route(
      "/api/v1/employee/highestSalary",
      get(routes::highest_salary::<C>),
    )
    .route(
      "/api/v1/employee/topTenHighestEarningEmployeeNames",
      get(routes::top_ten_names::<C>),
    )
    .route(
      "/api/v1/employee/:id",
      get(routes::get_employee::<C>).delete(routes::delete_employee::<C>),
    )
    .layer(CatchPanicLayer::custom(panic_response))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
  AppError::Unexpected("request handler panicked".to_string()).into_response()
}
