//! The `StatusStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`minder-store-sqlite` for
//! durables, [`crate::memory::MemoryStore`] for tests and tooling). Higher
//! layers depend on this abstraction, not on any concrete backend.

use std::{collections::BTreeMap, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  record::{HistoryEntry, StatusRecord},
  status::TicketStatus,
};

// ─── Query and projection types ──────────────────────────────────────────────

/// Parameters for [`StatusStore::history`]. All bounds are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryQuery {
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
  /// Keep only the most recent N entries after date filtering. Order stays
  /// oldest-first.
  pub limit:      Option<usize>,
}

/// The compact per-ticket projection returned by [`StatusStore::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
  pub current_status: TicketStatus,
  pub last_updated:   DateTime<Utc>,
}

/// A snapshot row plus the entry behind it, returned by
/// [`StatusStore::latest`] for tickets updated after a cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestUpdate {
  pub current_status: TicketStatus,
  pub last_updated:   DateTime<Utc>,
  pub last_entry:     HistoryEntry,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a ticket-status store backend.
///
/// Writes are append-only: a record is created once, then only ever grows by
/// one history entry at a time. `append` derives the record's denormalised
/// fields from the entry it writes (current status, last-updated timestamp,
/// and the sticky `is_active` flag), atomically with the history insert.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StatusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one full record. Returns `None` if the ticket has never been seen.
  fn get<'a>(
    &'a self,
    ticket_id: &'a str,
  ) -> impl Future<Output = Result<Option<StatusRecord>, Self::Error>> + Send + 'a;

  /// Create a record from its first history entry. Fails if the ticket
  /// already has one.
  fn create<'a>(
    &'a self,
    ticket_id: &'a str,
    entry: HistoryEntry,
  ) -> impl Future<Output = Result<StatusRecord, Self::Error>> + Send + 'a;

  /// Append one entry to an existing record and return the updated record.
  /// Fails if the ticket is unknown.
  fn append<'a>(
    &'a self,
    ticket_id: &'a str,
    entry: HistoryEntry,
  ) -> impl Future<Output = Result<StatusRecord, Self::Error>> + Send + 'a;

  /// Date-filtered, length-capped history for one ticket, oldest-first.
  /// Returns `None` if the ticket is unknown (as opposed to an empty match).
  fn history<'a>(
    &'a self,
    ticket_id: &'a str,
    query: &'a HistoryQuery,
  ) -> impl Future<Output = Result<Option<Vec<HistoryEntry>>, Self::Error>> + Send + 'a;

  /// Current status for each requested ticket. Unknown tickets are simply
  /// absent from the result.
  fn snapshot<'a>(
    &'a self,
    ticket_ids: &'a [String],
  ) -> impl Future<Output = Result<BTreeMap<String, StatusSummary>, Self::Error>>
  + Send
  + 'a;

  /// Like [`StatusStore::snapshot`], but only tickets updated strictly after
  /// `since`, each with its most recent history entry.
  fn latest<'a>(
    &'a self,
    ticket_ids: &'a [String],
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<BTreeMap<String, LatestUpdate>, Self::Error>>
  + Send
  + 'a;
}
