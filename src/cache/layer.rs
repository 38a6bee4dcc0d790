//! Snapshot cache that orchestrates TTL checks, single-flight refresh and
//! stale-serve on top of a bulk fetcher.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::snapshot::Snapshot;
use super::traits::{CacheResult, Cacheable};
use crate::remote::RemoteError;
use crate::retry::RetryPolicy;

/// Default time-to-live for a snapshot.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error, Clone)]
pub enum CacheError {
  /// Refresh failed and there is no earlier snapshot to fall back on.
  #[error("No {entity} data available: {source}")]
  Unavailable {
    entity: &'static str,
    source: RemoteError,
  },
}

/// Point-in-time view of the cache, for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
  pub entity: &'static str,
  pub populated: bool,
  pub fresh: bool,
  pub count: usize,
  pub generation: u64,
  pub fetched_at: Option<DateTime<Utc>>,
  pub age_secs: Option<u64>,
  pub ttl_secs: u64,
}

#[derive(Debug, Clone, Copy)]
enum RefreshMode {
  /// Fetch only if the snapshot is still stale once exclusive access is held.
  IfStale,
  /// Fetch unless someone published a newer snapshot while we waited.
  Force { observed_generation: u64 },
}

/// Holds at most one current [`Snapshot`] and refreshes it on demand.
///
/// Reads take the shared lock only long enough to clone an `Arc`. Refreshes
/// are serialized by `refresh_lock`. Every caller notes the attempt counter
/// before queueing, and one that finds it moved once it holds the lock takes
/// the finished attempt's outcome instead of fetching. N callers that see a
/// stale snapshot at the same moment therefore cause one fetch sequence,
/// whether it succeeds or not.
pub struct SnapshotCache<T: Cacheable> {
  current: RwLock<Option<Arc<Snapshot<T>>>>,
  /// Guards refreshes and holds the error of the last finished attempt, if it failed
  refresh_lock: Mutex<Option<RemoteError>>,
  /// Bumped under `refresh_lock` after every finished fetch sequence
  attempts: AtomicU64,
  ttl: Duration,
  retry: RetryPolicy,
}

impl<T: Cacheable> Default for SnapshotCache<T> {
  fn default() -> Self {
    Self::new(DEFAULT_TTL)
  }
}

impl<T: Cacheable> SnapshotCache<T> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      current: RwLock::new(None),
      refresh_lock: Mutex::new(None),
      attempts: AtomicU64::new(0),
      ttl,
      retry: RetryPolicy::default(),
    }
  }

  /// Replace the retry policy used for refresh fetches.
  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Current snapshot, fresh or not, without triggering a fetch.
  pub async fn peek(&self) -> Option<Arc<Snapshot<T>>> {
    self.current.read().await.clone()
  }

  /// Return the current snapshot, refreshing it first if it is stale or absent.
  ///
  /// 1. Fresh snapshot: returned immediately, no exclusive access taken
  /// 2. Stale or missing: single-flight refresh with retry
  /// 3. Refresh failed with a prior snapshot: that snapshot is served (offline)
  /// 4. Refresh failed on a cold cache: [`CacheError::Unavailable`]
  pub async fn get<F, Fut>(&self, fetcher: F) -> Result<CacheResult<Arc<Snapshot<T>>>, CacheError>
  where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Vec<T>, RemoteError>> + Send,
  {
    let observed_attempt = self.attempts.load(Ordering::Acquire);
    if let Some(snapshot) = self.peek().await {
      if snapshot.is_fresh(self.ttl) {
        let cached_at = snapshot.fetched_at();
        return Ok(CacheResult::from_cache(snapshot, cached_at));
      }
    }

    self
      .refresh_with(RefreshMode::IfStale, observed_attempt, fetcher)
      .await
  }

  /// Fetch regardless of freshness.
  ///
  /// Callers queued behind an in-flight refresh reuse its result instead of
  /// fetching again. Failure handling matches [`SnapshotCache::get`].
  pub async fn refresh<F, Fut>(
    &self,
    fetcher: F,
  ) -> Result<CacheResult<Arc<Snapshot<T>>>, CacheError>
  where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Vec<T>, RemoteError>> + Send,
  {
    let observed_attempt = self.attempts.load(Ordering::Acquire);
    let observed_generation = self.peek().await.map_or(0, |s| s.generation());
    self
      .refresh_with(
        RefreshMode::Force { observed_generation },
        observed_attempt,
        fetcher,
      )
      .await
  }

  pub async fn status(&self) -> CacheStatus {
    let snapshot = self.peek().await;
    let ttl_secs = self.ttl.as_secs();

    match snapshot {
      Some(s) => CacheStatus {
        entity: T::entity_type(),
        populated: true,
        fresh: s.is_fresh(self.ttl),
        count: s.len(),
        generation: s.generation(),
        fetched_at: Some(s.fetched_at()),
        age_secs: Some(s.age().as_secs()),
        ttl_secs,
      },
      None => CacheStatus {
        entity: T::entity_type(),
        populated: false,
        fresh: false,
        count: 0,
        generation: 0,
        fetched_at: None,
        age_secs: None,
        ttl_secs,
      },
    }
  }

  async fn refresh_with<F, Fut>(
    &self,
    mode: RefreshMode,
    observed_attempt: u64,
    fetcher: F,
  ) -> Result<CacheResult<Arc<Snapshot<T>>>, CacheError>
  where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Vec<T>, RemoteError>> + Send,
  {
    let mut last_failure = self.refresh_lock.lock().await;
    let previous = self.peek().await;

    if let Some(snapshot) = &previous {
      match mode {
        RefreshMode::IfStale if snapshot.is_fresh(self.ttl) => {
          debug!(
            entity = T::entity_type(),
            generation = snapshot.generation(),
            "Snapshot refreshed by another caller"
          );
          let cached_at = snapshot.fetched_at();
          return Ok(CacheResult::from_cache(Arc::clone(snapshot), cached_at));
        }
        RefreshMode::Force {
          observed_generation,
        } if snapshot.generation() > observed_generation => {
          debug!(
            entity = T::entity_type(),
            generation = snapshot.generation(),
            "Forced refresh satisfied by concurrent refresh"
          );
          return Ok(CacheResult::from_network(Arc::clone(snapshot)));
        }
        _ => {}
      }
    }

    // an attempt finished while we queued; its failure is ours too
    if self.attempts.load(Ordering::Acquire) != observed_attempt {
      if let Some(err) = last_failure.clone() {
        debug!(
          entity = T::entity_type(),
          error = %err,
          "Reusing failed refresh from another caller"
        );
        return self.fall_back(previous, err);
      }
    }

    let started = Instant::now();
    let outcome = self.retry.execute(fetcher, RemoteError::is_transient).await;
    *last_failure = outcome.as_ref().err().cloned();
    self.attempts.fetch_add(1, Ordering::Release);

    match outcome {
      Ok(items) => {
        let generation = previous.as_ref().map_or(0, |s| s.generation()) + 1;
        let snapshot = Arc::new(Snapshot::new(items, generation));
        *self.current.write().await = Some(Arc::clone(&snapshot));

        info!(
          entity = T::entity_type(),
          count = snapshot.len(),
          generation,
          elapsed_ms = started.elapsed().as_millis() as u64,
          "Snapshot refreshed"
        );
        Ok(CacheResult::from_network(snapshot))
      }
      Err(err) => {
        match &previous {
          Some(snapshot) => warn!(
            entity = T::entity_type(),
            age_secs = snapshot.age().as_secs(),
            generation = snapshot.generation(),
            error = %err,
            "Refresh failed, serving stale snapshot"
          ),
          None => error!(
            entity = T::entity_type(),
            error = %err,
            "Refresh failed with no snapshot to fall back on"
          ),
        }
        self.fall_back(previous, err)
      }
    }
  }

  /// Stale-serve the previous snapshot, or report the cache unavailable.
  fn fall_back(
    &self,
    previous: Option<Arc<Snapshot<T>>>,
    err: RemoteError,
  ) -> Result<CacheResult<Arc<Snapshot<T>>>, CacheError> {
    match previous {
      Some(snapshot) => {
        let cached_at = snapshot.fetched_at();
        Ok(CacheResult::offline(snapshot, cached_at))
      }
      None => Err(CacheError::Unavailable {
        entity: T::entity_type(),
        source: err,
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;
  use crate::remote::types::Employee;
  use crate::remote::EmployeeApi;
  use crate::test_support::{employee, sample_employees, FakeApi};
  use reqwest::StatusCode;

  const TTL: Duration = Duration::from_secs(300);

  fn cache() -> SnapshotCache<Employee> {
    SnapshotCache::new(TTL)
  }

  fn names(snapshot: &Snapshot<Employee>) -> Vec<&str> {
    snapshot.items().iter().map(|e| e.name.as_str()).collect()
  }

  fn unreachable() -> RemoteError {
    RemoteError::Unreachable("connection refused".to_string())
  }

  #[tokio::test(start_paused = true)]
  async fn test_reads_within_ttl_share_one_fetch() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    let first = cache.get(|| api.fetch_all()).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);

    for _ in 0..10 {
      let result = cache.get(|| api.fetch_all()).await.unwrap();
      assert_eq!(result.source, CacheSource::CacheFresh);
      assert_eq!(result.data.len(), 3);
    }
    assert_eq!(api.fetch_count(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_snapshot_is_refetched() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    cache.get(|| api.fetch_all()).await.unwrap();
    api.set_employees(vec![employee("9", "Ada Lovelace", 99_000)]);

    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    let still_fresh = cache.get(|| api.fetch_all()).await.unwrap();
    assert_eq!(names(&still_fresh.data).len(), 3);

    tokio::time::advance(Duration::from_secs(1)).await;
    let refreshed = cache.get(|| api.fetch_all()).await.unwrap();
    assert_eq!(refreshed.source, CacheSource::Network);
    assert_eq!(names(&refreshed.data), vec!["Ada Lovelace"]);
    assert_eq!(refreshed.data.generation(), 2);
    assert_eq!(api.fetch_count(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_cold_reads_fetch_once() {
    let api = FakeApi::new(sample_employees()).with_latency(Duration::from_millis(200));
    let cache = cache();

    let reads = (0..16).map(|_| cache.get(|| api.fetch_all()));
    let results = futures::future::join_all(reads).await;

    assert_eq!(api.fetch_count(), 1);
    for result in results {
      let result = result.unwrap();
      assert_eq!(result.data.generation(), 1);
      assert_eq!(result.data.len(), 3);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_stale_reads_across_tasks_fetch_once() {
    let api = Arc::new(FakeApi::new(sample_employees()).with_latency(Duration::from_millis(50)));
    let cache = Arc::new(cache());

    cache.get(|| api.fetch_all()).await.unwrap();
    tokio::time::advance(TTL).await;

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let api = Arc::clone(&api);
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
          let result = cache.get(|| api.fetch_all()).await.unwrap();
          result.data.generation()
        })
      })
      .collect();

    for handle in handles {
      assert_eq!(handle.await.unwrap(), 2);
    }
    assert_eq!(api.fetch_count(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_refresh_serves_stale_snapshot() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    cache.get(|| api.fetch_all()).await.unwrap();
    tokio::time::advance(TTL).await;
    api.fail_fetches_with(Some(unreachable()));

    let result = cache.get(|| api.fetch_all()).await.unwrap();
    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data.generation(), 1);
    assert_eq!(result.data.len(), 3);
    assert!(result.cached_at.is_some());
    // one initial fetch, then the full retry budget
    assert_eq!(api.fetch_count(), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_snapshot_is_refetched_on_next_read() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    cache.get(|| api.fetch_all()).await.unwrap();
    tokio::time::advance(TTL).await;
    api.fail_fetches_with(Some(unreachable()));
    cache.get(|| api.fetch_all()).await.unwrap();

    api.fail_fetches_with(None);
    let recovered = cache.get(|| api.fetch_all()).await.unwrap();
    assert_eq!(recovered.source, CacheSource::Network);
    assert_eq!(recovered.data.generation(), 2);
    assert_eq!(api.fetch_count(), 5);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cold_start_failure_is_unavailable() {
    let api = FakeApi::new(sample_employees());
    api.fail_fetches_with(Some(RemoteError::Timeout));
    let cache = cache();
    let started = Instant::now();

    let err = cache.get(|| api.fetch_all()).await.unwrap_err();
    let CacheError::Unavailable { entity, source } = err;
    assert_eq!(entity, "employee");
    assert!(matches!(source, RemoteError::Timeout));
    assert_eq!(api.fetch_count(), 3);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(cache.peek().await.is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_stale_reads_share_one_failed_refresh() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    cache.get(|| api.fetch_all()).await.unwrap();
    tokio::time::advance(TTL).await;
    api.fail_fetches_with(Some(RemoteError::Timeout));

    let started = Instant::now();
    let reads = (0..8).map(|_| cache.get(|| api.fetch_all()));
    let results = futures::future::join_all(reads).await;

    // one initial fetch, then a single retry sequence for all readers
    assert_eq!(api.fetch_count(), 1 + 3);
    assert!(started.elapsed() < Duration::from_secs(3));
    for result in results {
      let result = result.unwrap();
      assert_eq!(result.source, CacheSource::Offline);
      assert_eq!(result.data.generation(), 1);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_cold_reads_share_one_failed_refresh() {
    let api = FakeApi::new(sample_employees());
    api.fail_fetches_with(Some(RemoteError::Timeout));
    let cache = cache();

    let started = Instant::now();
    let reads = (0..8).map(|_| cache.get(|| api.fetch_all()));
    let results = futures::future::join_all(reads).await;

    assert_eq!(api.fetch_count(), 3);
    assert!(started.elapsed() < Duration::from_secs(3));
    for result in results {
      let CacheError::Unavailable { source, .. } = result.unwrap_err();
      assert!(matches!(source, RemoteError::Timeout));
    }

    // a later read is a new attempt
    api.fail_fetches_with(None);
    assert!(cache.get(|| api.fetch_all()).await.is_ok());
    assert_eq!(api.fetch_count(), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn test_permanent_failure_is_not_retried() {
    let api = FakeApi::new(sample_employees());
    api.fail_fetches_with(Some(RemoteError::from_status(
      StatusCode::INTERNAL_SERVER_ERROR,
      "boom".to_string(),
    )));
    let cache = cache();

    assert!(cache.get(|| api.fetch_all()).await.is_err());
    assert_eq!(api.fetch_count(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_forced_refresh_ignores_ttl() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    let before = cache.get(|| api.fetch_all()).await.unwrap().data;
    api.set_employees(vec![employee("9", "Ada Lovelace", 99_000)]);

    let after = cache.refresh(|| api.fetch_all()).await.unwrap();
    assert_eq!(after.source, CacheSource::Network);
    assert_eq!(after.data.generation(), 2);
    assert_eq!(names(&after.data), vec!["Ada Lovelace"]);
    assert_eq!(api.fetch_count(), 2);

    // a reader holding the old snapshot is unaffected
    assert_eq!(before.generation(), 1);
    assert_eq!(
      names(&before),
      vec!["John Doe", "Jane Smith", "Bob Johnson"]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_forced_refreshes_coalesce() {
    let api = FakeApi::new(sample_employees()).with_latency(Duration::from_millis(100));
    let cache = cache();
    cache.get(|| api.fetch_all()).await.unwrap();

    let refreshes = (0..5).map(|_| cache.refresh(|| api.fetch_all()));
    let results = futures::future::join_all(refreshes).await;

    assert_eq!(api.fetch_count(), 2);
    for result in results {
      assert_eq!(result.unwrap().data.generation(), 2);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_forced_refresh_keeps_snapshot() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();
    cache.get(|| api.fetch_all()).await.unwrap();

    api.fail_fetches_with(Some(unreachable()));
    let result = cache.refresh(|| api.fetch_all()).await.unwrap();
    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data.generation(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_status_reports_snapshot() {
    let api = FakeApi::new(sample_employees());
    let cache = cache();

    let empty = cache.status().await;
    assert!(!empty.populated);
    assert_eq!(empty.generation, 0);
    assert_eq!(empty.ttl_secs, 300);

    cache.get(|| api.fetch_all()).await.unwrap();
    tokio::time::advance(Duration::from_secs(42)).await;

    let status = cache.status().await;
    assert!(status.populated);
    assert!(status.fresh);
    assert_eq!(status.count, 3);
    assert_eq!(status.generation, 1);
    assert_eq!(status.age_secs, Some(42));
    assert!(status.fetched_at.is_some());

    tokio::time::advance(TTL).await;
    assert!(!cache.status().await.fresh);
  }

  #[tokio::test(start_paused = true)]
  async fn test_single_attempt_policy() {
    let api = FakeApi::new(sample_employees());
    api.fail_fetches_with(Some(unreachable()));
    let cache = cache().with_retry_policy(RetryPolicy::new(1, Duration::ZERO));

    assert!(cache.get(|| api.fetch_all()).await.is_err());
    assert_eq!(api.fetch_count(), 1);
  }
}
