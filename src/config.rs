use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::retry::RetryPolicy;

/// Environment variable that overrides `remote.base_url`.
pub const REMOTE_URL_ENV: &str = "ROSTER_REMOTE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub remote: RemoteConfig,
  pub cache: CacheConfig,
  pub pagination: PaginationConfig,
  pub server: ServerConfig,
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
  /// Base URL of the directory service, e.g. `http://localhost:8112/api/v1`
  pub base_url: String,
  pub connect_timeout_secs: u64,
  pub read_timeout_secs: u64,
}

impl Default for RemoteConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8112/api/v1".to_string(),
      connect_timeout_secs: 10,
      read_timeout_secs: 30,
    }
  }
}

impl RemoteConfig {
  pub fn connect_timeout(&self) -> Duration {
    Duration::from_secs(self.connect_timeout_secs)
  }

  pub fn read_timeout(&self) -> Duration {
    Duration::from_secs(self.read_timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// How long a snapshot is served before the next read refreshes it
  pub ttl_secs: u64,
  /// Total attempts per remote call, including the first
  pub retry_attempts: u32,
  pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: 300,
      retry_attempts: 3,
      retry_delay_ms: 1000,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(
      self.retry_attempts,
      Duration::from_millis(self.retry_delay_ms),
    )
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
  pub default_page_size: u32,
  /// Larger requested sizes are clamped to this
  pub max_page_size: u32,
}

impl Default for PaginationConfig {
  fn default() -> Self {
    Self {
      default_page_size: crate::pagination::DEFAULT_PAGE_SIZE,
      max_page_size: crate::pagination::MAX_PAGE_SIZE,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub bind: SocketAddr,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: SocketAddr::from(([127, 0, 0, 1], 8111)),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter directive, overridden by `ROSTER_LOG`
  pub level: String,
  /// When set, a daily-rotated log file is also written here
  pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./roster.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/roster/config.yaml
  ///
  /// Without any file the built-in defaults apply. `ROSTER_REMOTE_URL`
  /// overrides the remote base URL either way. The result is not validated,
  /// so callers apply their own overrides first and then call
  /// [`Config::validate`].
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var(REMOTE_URL_ENV) {
      config.remote.base_url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("roster.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("roster").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // an empty file deserializes to unit, not to an empty mapping
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Reject settings the server cannot run with.
  pub fn validate(&self) -> Result<()> {
    self.remote_url()?;

    if self.cache.retry_attempts == 0 {
      return Err(eyre!("cache.retry_attempts must be at least 1"));
    }

    let pagination = &self.pagination;
    if pagination.default_page_size == 0 {
      return Err(eyre!("pagination.default_page_size must be at least 1"));
    }
    if pagination.default_page_size > pagination.max_page_size {
      return Err(eyre!(
        "pagination.default_page_size ({}) exceeds pagination.max_page_size ({})",
        pagination.default_page_size,
        pagination.max_page_size
      ));
    }

    Ok(())
  }

  /// The remote base URL, parsed.
  pub fn remote_url(&self) -> Result<Url> {
    Url::parse(&self.remote.base_url)
      .map_err(|e| eyre!("Invalid remote.base_url '{}': {}", self.remote.base_url, e))
  }
}
