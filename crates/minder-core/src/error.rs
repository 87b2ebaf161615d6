//! Error types for `minder-core`.

use thiserror::Error;

use crate::status::TicketStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown status value: {0:?}")]
  UnknownStatus(String),

  #[error("invalid transition: {from} -> {to}")]
  InvalidTransition {
    from: TicketStatus,
    to:   TicketStatus,
  },

  #[error("missing field: {0}")]
  MissingField(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("notifier error: {0}")]
  Notify(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(source))
  }

  pub fn notify(
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Notify(Box::new(source))
  }

  /// Whether retrying the same input could plausibly succeed.
  ///
  /// Infrastructure failures (store, notifier) are retryable; validation and
  /// transition failures are deterministic and are not.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Store(_) | Self::Notify(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
