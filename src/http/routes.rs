use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use url::form_urlencoded;

use super::ApiState;
use crate::cache::CacheStatus;
use crate::config::PaginationConfig;
use crate::error::{AppError, AppResult};
use crate::pagination::{PagedResult, PaginationRequest, Sort};
use crate::remote::api_types::CreateEmployeeInput;
use crate::remote::types::Employee;
use crate::remote::EmployeeApi;

/// `page`, `size` and `sort` as sent. Parsed by hand so bad values come
/// back as field errors instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  page: Option<String>,
  size: Option<String>,
  sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  #[serde(rename = "searchString")]
  search_string: Option<String>,
  #[serde(flatten)]
  paging: PageParams,
}

impl PageParams {
  fn to_request(&self, config: &PaginationConfig) -> AppResult<PaginationRequest> {
    let page = match non_blank(&self.page) {
      None => 0,
      Some(raw) => {
        let page: i64 = raw
          .parse()
          .map_err(|_| AppError::invalid("page", "Page must be a whole number"))?;
        if page < 0 {
          return Err(AppError::invalid("page", "Page must not be negative"));
        }
        u32::try_from(page).map_err(|_| AppError::invalid("page", "Page is too large"))?
      }
    };

    let size = match non_blank(&self.size) {
      None => config.default_page_size,
      Some(raw) => {
        let size: i64 = raw
          .parse()
          .map_err(|_| AppError::invalid("size", "Size must be a whole number"))?;
        if size < 1 {
          return Err(AppError::invalid("size", "Size must be at least 1"));
        }
        size.min(i64::from(config.max_page_size)) as u32
      }
    };

    let sort = non_blank(&self.sort).map(str::parse::<Sort>).transpose()?;

    Ok(PaginationRequest::new(page, size)?.with_sort(sort))
  }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn moved_permanently(location: String) -> impl IntoResponse {
  (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)])
}

pub async fn list_employees<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
  Query(params): Query<PageParams>,
) -> AppResult<Json<PagedResult<Employee>>> {
  let request = params.to_request(&state.pagination)?;
  Ok(Json(state.service.get_employees_paged(&request).await?))
}

pub async fn search_employees<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
  Query(params): Query<SearchParams>,
) -> AppResult<Json<PagedResult<Employee>>> {
  let needle = non_blank(&params.search_string).ok_or_else(|| {
    AppError::invalid(
      "searchString",
      "Search string is required and cannot be blank",
    )
  })?;
  let request = params.paging.to_request(&state.pagination)?;

  Ok(Json(
    state.service.search_by_name_paged(needle, &request).await?,
  ))
}

pub async fn refresh_cache<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
) -> AppResult<Json<CacheStatus>> {
  Ok(Json(state.service.refresh().await?))
}

pub async fn cache_status<C: EmployeeApi>(State(state): State<ApiState<C>>) -> Json<CacheStatus> {
  Json(state.service.cache_status().await)
}

/// The unpaged listing is served by the paged endpoint.
pub async fn redirect_all<C: EmployeeApi>(State(state): State<ApiState<C>>) -> impl IntoResponse {
  info!("Redirecting full listing to paged endpoint");
  moved_permanently(format!(
    "/api/v1/employees?page=0&size={}",
    state.pagination.default_page_size
  ))
}

pub async fn redirect_search<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
  Path(search_string): Path<String>,
) -> impl IntoResponse {
  info!(%search_string, "Redirecting search to paged endpoint");
  let query = form_urlencoded::Serializer::new(String::new())
    .append_pair("searchString", &search_string)
    .append_pair("page", "0")
    .append_pair("size", &state.pagination.default_page_size.to_string())
    .finish();
  moved_permanently(format!("/api/v1/employees/search?{}", query))
}

pub async fn get_employee<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
  Path(id): Path<String>,
) -> AppResult<Json<Employee>> {
  Ok(Json(state.service.get_employee_by_id(&id).await?))
}

pub async fn highest_salary<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
) -> AppResult<Json<u32>> {
  Ok(Json(state.service.get_highest_salary().await?))
}

pub async fn top_ten_names<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
) -> AppResult<Json<Vec<String>>> {
  Ok(Json(
    state.service.get_top_ten_highest_earning_names().await?,
  ))
}

pub async fn create_employee<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
  payload: Result<Json<CreateEmployeeInput>, JsonRejection>,
) -> AppResult<Json<Employee>> {
  let Json(input) = payload.map_err(|rejection| AppError::invalid("body", rejection.body_text()))?;
  Ok(Json(state.service.create_employee(&input).await?))
}

pub async fn delete_employee<C: EmployeeApi>(
  State(state): State<ApiState<C>>,
  Path(id): Path<String>,
) -> AppResult<Json<String>> {
  Ok(Json(state.service.delete_employee_by_id(&id).await?))
}
