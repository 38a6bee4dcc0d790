//! Fixed-delay retry helper shared by the snapshot refresh and remote writes.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one
  max_attempts: u32,
  /// Pause between consecutive attempts
  delay: Duration,
}

impl Default for RetryPolicy {
  /// Three attempts, one second apart.
  fn default() -> Self {
    Self::new(3, Duration::from_secs(1))
  }
}

impl RetryPolicy {
  /// Create a policy. `max_attempts` below one is treated as one.
  pub fn new(max_attempts: u32, delay: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      delay,
    }
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// Run `operation` until it succeeds, fails with an error `is_retryable`
  /// rejects, or the attempt budget is spent. The last error is returned.
  pub async fn execute<F, Fut, T, E, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
  {
    let mut attempt = 1;

    loop {
      match operation().await {
        Ok(value) => {
          if attempt > 1 {
            debug!(attempt, "Operation succeeded after retry");
          }
          return Ok(value);
        }
        Err(err) => {
          let retryable = is_retryable(&err);
          if retryable && attempt < self.max_attempts {
            warn!(
              attempt,
              max_attempts = self.max_attempts,
              delay = ?self.delay,
              error = %err,
              "Transient failure, retrying"
            );
            sleep(self.delay).await;
            attempt += 1;
          } else {
            if retryable {
              warn!(attempts = attempt, error = %err, "Giving up after retries");
            } else {
              debug!(error = %err, "Permanent error, not retrying");
            }
            return Err(err);
          }
        }
      }
    }
  }
}
