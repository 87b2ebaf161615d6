//! JSON REST API for Minder.
//!
//! Exposes an axum [`Router`] backed by an
//! [`UpdateEngine`](minder_core::engine::UpdateEngine) over any store and
//! notifier pair. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! Mount it wherever the host router lives:
//!
//! ```rust,ignore
//! .merge(minder_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod status;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use minder_core::{engine::UpdateEngine, notify::Notifier, store::StatusStore};

pub use error::ApiError;

/// Build the status API router around `engine`.
///
/// State is applied here, so the result is a plain `Router<()>` that nests
/// into a host router of any state type.
pub fn api_router<S, N>(engine: Arc<UpdateEngine<S, N>>) -> Router<()>
where
  S: StatusStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .route("/status/{ticket_id}", get(status::get_one::<S, N>))
    .route("/status/{ticket_id}/history", get(status::history::<S, N>))
    .route("/status/{ticket_id}/update", post(status::update::<S, N>))
    .route("/status/batch", post(status::batch::<S, N>))
    .route("/status/updates", post(status::updates::<S, N>))
    .with_state(engine)
}

// ─── Integration tests ───────────────────────────────────────────────────────
