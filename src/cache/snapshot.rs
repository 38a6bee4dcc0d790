use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::traits::Cacheable;

/// An immutable, timestamped copy of the full remote dataset.
///
/// Snapshots are never modified after publication; a refresh builds a new
/// one. Readers hold an `Arc` and keep seeing the data they started with.
#[derive(Debug)]
pub struct Snapshot<T> {
  items: Arc<[T]>,
  /// Monotonic capture time, used for TTL decisions
  captured_at: Instant,
  /// Wall-clock capture time, used for reporting
  fetched_at: DateTime<Utc>,
  generation: u64,
}

impl<T: Cacheable> Snapshot<T> {
  pub(super) fn new(items: Vec<T>, generation: u64) -> Self {
    Self {
      items: items.into(),
      captured_at: Instant::now(),
      fetched_at: Utc::now(),
      generation,
    }
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  /// Shared handle to the items, detached from the snapshot.
  pub fn shared(&self) -> Arc<[T]> {
    Arc::clone(&self.items)
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Publication counter, starting at 1 for the first successful fetch.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn fetched_at(&self) -> DateTime<Utc> {
    self.fetched_at
  }

  pub fn age(&self) -> Duration {
    self.captured_at.elapsed()
  }

  /// True while `now < captured_at + ttl`.
  pub fn is_fresh(&self, ttl: Duration) -> bool {
    self.age() < ttl
  }

  /// Linear scan by cache key.
  pub fn get(&self, key: &str) -> Option<&T> {
    self.items.iter().find(|item| item.cache_key() == key)
  }

  /// Owning iterator over the items.
  pub fn stream(&self) -> SnapshotIter<T> {
    SnapshotIter {
      items: self.shared(),
      next: 0,
    }
  }
}

/// Iterator that keeps its snapshot's items alive, independent of the cache.
#[derive(Debug, Clone)]
pub struct SnapshotIter<T> {
  items: Arc<[T]>,
  next: usize,
}

impl<T: Clone> Iterator for SnapshotIter<T> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    let item = self.items.get(self.next)?.clone();
    self.next += 1;
    Some(item)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = self.items.len().saturating_sub(self.next);
    (remaining, Some(remaining))
  }
}

impl<T: Clone> ExactSizeIterator for SnapshotIter<T> {}
