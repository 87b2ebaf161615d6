//! Error type for `minder-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] minder_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("timestamp parse error: {0}")]
  DateParse(String),

  /// Attempted to append to a ticket that has no record.
  #[error("ticket not found: {0}")]
  TicketNotFound(String),

  /// Attempted to create a record for a ticket that already has one.
  #[error("ticket already exists: {0}")]
  TicketExists(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
