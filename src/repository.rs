//! Read-side facade over the directory service.
//!
//! Every read goes through the snapshot cache, so callers get paging,
//! search and lookups without a remote call per request.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheStatus, Snapshot, SnapshotCache, SnapshotIter};
use crate::error::{AppError, AppResult};
use crate::pagination::{paginate, PagedResult, PaginationRequest};
use crate::remote::types::Employee;
use crate::remote::EmployeeApi;

/// Employee reads with transparent snapshot caching.
///
/// This wraps a directory client and answers every query from the current
/// snapshot, refreshing it when the TTL has run out.
pub struct EmployeeRepository<C: EmployeeApi> {
  client: C,
  cache: SnapshotCache<Employee>,
}

impl<C: EmployeeApi> EmployeeRepository<C> {
  pub fn new(client: C, cache: SnapshotCache<Employee>) -> Self {
    Self { client, cache }
  }

  /// The underlying client, for operations that bypass the cache.
  pub fn client(&self) -> &C {
    &self.client
  }

  async fn snapshot(&self) -> AppResult<Arc<Snapshot<Employee>>> {
    let result = self.cache.get(|| self.client.fetch_all()).await?;
    debug!(
      source = ?result.source,
      generation = result.data.generation(),
      "Serving employee snapshot"
    );
    Ok(result.data)
  }

  /// Every employee, in snapshot order. The slice is shared, not copied.
  pub async fn find_all(&self) -> AppResult<Arc<[Employee]>> {
    Ok(self.snapshot().await?.shared())
  }

  pub async fn find_all_paged(
    &self,
    request: &PaginationRequest,
  ) -> AppResult<PagedResult<Employee>> {
    let snapshot = self.snapshot().await?;
    if request.sort().is_none() {
      return Ok(paginate(snapshot.items(), request));
    }
    Ok(page_of(snapshot.items().iter().collect(), request))
  }

  /// Case-insensitive substring search on the name, filtered over the whole
  /// snapshot before paging. An empty needle matches everyone.
  pub async fn find_by_name_containing(
    &self,
    needle: &str,
    request: &PaginationRequest,
  ) -> AppResult<PagedResult<Employee>> {
    let snapshot = self.snapshot().await?;
    let needle = needle.to_lowercase();
    let matches = snapshot
      .items()
      .iter()
      .filter(|e| e.name_contains(&needle))
      .collect();
    Ok(page_of(matches, request))
  }

  pub async fn find_by_id(&self, id: &str) -> AppResult<Employee> {
    self
      .snapshot()
      .await?
      .get(id)
      .cloned()
      .ok_or_else(|| AppError::NotFound(id.to_string()))
  }

  pub async fn count(&self) -> AppResult<usize> {
    Ok(self.snapshot().await?.len())
  }

  /// Iterator over the current snapshot. It keeps that snapshot alive and
  /// is unaffected by later refreshes.
  pub async fn stream_all(&self) -> AppResult<SnapshotIter<Employee>> {
    Ok(self.snapshot().await?.stream())
  }

  /// Refetch now, regardless of the TTL.
  pub async fn refresh(&self) -> AppResult<CacheStatus> {
    let result = self.cache.refresh(|| self.client.fetch_all()).await?;
    debug!(source = ?result.source, "Forced refresh finished");
    Ok(self.cache.status().await)
  }

  pub async fn cache_status(&self) -> CacheStatus {
    self.cache.status().await
  }
}

/// Stable-sort the matches if asked to, then cut out the requested page.
fn page_of(mut items: Vec<&Employee>, request: &PaginationRequest) -> PagedResult<Employee> {
  if let Some(sort) = request.sort() {
    items.sort_by(|a, b| sort.compare(a, b));
  }
  paginate(&items, request).map(|e| e.clone())
}
