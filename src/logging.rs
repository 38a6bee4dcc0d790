//! Tracing subscriber setup: stdout always, plus an optional daily log file.

use color_eyre::{eyre::eyre, Result};
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Overrides `logging.level` when set.
pub const LOG_ENV: &str = "ROSTER_LOG";
const LOG_FILE_PREFIX: &str = "roster.log";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop, so keep it alive
/// for the life of the process.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
  let env_override = std::env::var(LOG_ENV).ok();
  let filter = build_filter(env_override.as_deref(), &config.level)?;

  let stdout_layer = tracing_subscriber::fmt::layer()
    .with_writer(io::stdout)
    .with_target(true)
    .with_filter(filter.clone());

  let (file_layer, guard) = match &config.directory {
    Some(dir) => {
      let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
      let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(stdout_layer)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  tracing::info!(
    level = %config.level,
    file_output = config.directory.is_some(),
    "Logger initialized"
  );

  Ok(guard)
}

/// The environment directive wins over the configured level.
fn build_filter(env_override: Option<&str>, level: &str) -> Result<EnvFilter> {
  let directive = env_override
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .unwrap_or(level);

  EnvFilter::try_new(directive).map_err(|e| eyre!("Invalid log filter '{}': {}", directive, e))
}
