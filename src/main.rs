use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use roster::cache::SnapshotCache;
use roster::http::{self, ApiState};
use roster::remote::RemoteClient;
use roster::repository::EmployeeRepository;
use roster::service::EmployeeService;
use roster::{config, logging};

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Paginated, cached front for a bulk-only employee directory")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./roster.yaml, then $XDG_CONFIG_HOME/roster/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the directory service, overriding config and ROSTER_REMOTE_URL
  #[arg(long)]
  remote_url: Option<String>,

  /// Address to listen on
  #[arg(short, long)]
  bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration, then apply command line overrides
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.remote_url {
    config.remote.base_url = url;
  }
  if let Some(bind) = args.bind {
    config.server.bind = bind;
  }
  config.validate()?;

  let _log_guard = logging::init(&config.logging)?;

  let client = RemoteClient::new(&config.remote)?;
  info!(url = %client.employees_url(), "Using directory service");

  let cache = SnapshotCache::new(config.cache.ttl()).with_retry_policy(config.cache.retry_policy());
  let repository = EmployeeRepository::new(client, cache);
  let service = Arc::new(EmployeeService::new(
    repository,
    config.cache.retry_policy(),
  ));
  let app = http::router(ApiState::new(service, config.pagination.clone()));

  let listener = tokio::net::TcpListener::bind(config.server.bind)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", config.server.bind, e))?;
  info!(
    addr = %config.server.bind,
    ttl_secs = config.cache.ttl_secs,
    "Listening"
  );

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("Shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "Failed to listen for shutdown signal");
    // never resolve, so the server keeps running
    std::future::pending::<()>().await;
  }
  info!("Shutdown signal received");
}
