//! Minder server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, starts the feed consumer, and serves the status API over HTTP until
//! interrupted.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use minder_core::engine::UpdateEngine;
use minder_feed::{Consumer, InMemoryBus};
use minder_server::ServerConfig;
use minder_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Minder ticket-status tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // The config file is optional; MINDER_* env vars override it either way.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MINDER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.store_path)
    })?;

  // Wire the engine to the in-process bus and start draining feed events.
  let bus = Arc::new(InMemoryBus::new());
  let engine = Arc::new(UpdateEngine::new(Arc::new(store), bus.clone()));

  let (shutdown_tx, _) = broadcast::channel(1);
  let consumer = Consumer::new(
    engine.clone(),
    bus.subscribe_inbound(),
    shutdown_tx.subscribe(),
  )
  .spawn();

  let app = minder_server::app(engine);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // HTTP side is drained; now stop the feed consumer.
  let _ = shutdown_tx.send(());
  consumer.await.context("feed consumer panicked")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(error) = tokio::signal::ctrl_c().await {
    tracing::error!(%error, "failed to listen for shutdown signal");
  }
}
