//! absensi server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `ABSENSI_*` environment variables, waits for the SQLite database with
//! bounded retry, and serves the attendance API over HTTP until Ctrl-C.

mod config;

use std::{path::PathBuf, sync::Arc};

use absensi_api::AppState;
use absensi_core::timestamp;
use absensi_metrics::Metrics;
use absensi_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Attendance (absensi) HTTP service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = ::config::Config::builder()
    .add_source(::config::File::from(cli.config).required(false))
    .add_source(::config::Environment::with_prefix("ABSENSI").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let zone = timestamp::parse_zone(&server_cfg.timezone)
    .context("invalid timezone in configuration")?;

  let metrics = Metrics::new().context("failed to register metrics")?;

  // Wait for the database; gives up after the configured attempts.
  let store = match SqliteStore::bootstrap(
    &server_cfg.database_path,
    server_cfg.retry_policy(),
    metrics.clone(),
  )
  .await
  {
    Ok(store) => store,
    Err(e) => {
      tracing::error!(
        error = %e,
        path = %server_cfg.database_path.display(),
        "database unavailable, shutting down"
      );
      return Err(e).context("startup failed");
    }
  };

  let state = AppState { store: Arc::new(store), metrics, zone };

  let app = absensi_api::router(state).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}
