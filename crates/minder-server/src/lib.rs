//! Process assembly for the Minder server: configuration and the top-level
//! axum application.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use minder_core::{engine::UpdateEngine, notify::Notifier, store::StatusStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `MINDER_*` environment. Every field has a default, so an empty config is a
/// working local setup.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

fn default_host() -> String {
  "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
  8080
}

fn default_store_path() -> PathBuf {
  PathBuf::from("minder.db")
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The full HTTP application: the status API plus request tracing.
pub fn app<S, N>(engine: Arc<UpdateEngine<S, N>>) -> Router
where
  S: StatusStore + 'static,
  N: Notifier + 'static,
{
  minder_api::api_router(engine).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_yields_local_defaults() {
    let settings = config::Config::builder().build().unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.store_path, PathBuf::from("minder.db"));
  }

  #[test]
  fn config_fields_override_defaults() {
    let settings = config::Config::builder()
      .set_override("port", 9090)
      .unwrap()
      .set_override("store_path", "/var/lib/minder/minder.db")
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/minder/minder.db"));
  }
}
