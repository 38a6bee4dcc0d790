//! Snapshot cache for a remote source that only supports bulk fetches.
//!
//! This module provides a source-agnostic caching mechanism that:
//! - Holds one immutable, timestamped snapshot of the whole dataset
//! - Refreshes it at most once per staleness episode (single-flight)
//! - Retries transient network failures before giving up
//! - Provides basic offline mode (serve stale snapshot when refresh fails)

mod layer;
mod snapshot;
mod traits;

pub use layer::{CacheError, CacheStatus, SnapshotCache, DEFAULT_TTL};
pub use snapshot::{Snapshot, SnapshotIter};
pub use traits::{CacheResult, CacheSource, Cacheable};
