//! The outbound notification seam.
//!
//! When the engine commits a status change that originated outside the feed,
//! it hands a [`StatusChange`] to a [`Notifier`]. What lies behind the trait
//! (an in-process bus, a broker client) is the caller's business; delivery is
//! at-least-once, so every change carries a fresh `event_id` that downstream
//! consumers can deduplicate on.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{record::HistoryEntry, status::TicketStatus};

/// One committed status change, as published to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
  /// Correlation id, unique per publish. Redeliveries reuse it, so idempotent
  /// consumers can drop the second copy.
  pub event_id:   Uuid,
  pub ticket_id:  String,
  pub status:     TicketStatus,
  pub updated_by: String,
  pub reason:     String,
  pub timestamp:  DateTime<Utc>,
}

impl StatusChange {
  /// Build the outbound change for a freshly committed history entry.
  pub fn for_entry(ticket_id: &str, entry: &HistoryEntry) -> Self {
    Self {
      event_id:   Uuid::new_v4(),
      ticket_id:  ticket_id.to_owned(),
      status:     entry.status,
      updated_by: entry.updated_by.clone(),
      reason:     entry.reason.clone(),
      timestamp:  entry.timestamp,
    }
  }
}

/// Abstraction over the outbound status-change channel.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Publish one committed change. Called after the store write has
  /// succeeded; a failure here does not roll the write back.
  fn publish<'a>(
    &'a self,
    change: &'a StatusChange,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
