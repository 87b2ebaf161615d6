//! Status records and the update inputs/outputs that move them.
//!
//! A record is one ticket's current status plus its full, append-only history.
//! The `history` vector is ordered oldest-first and is never rewritten; every
//! change appends an entry, and `current_status` always mirrors the last one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::TicketStatus;

/// Actor recorded when an inbound event names nobody.
pub const SYSTEM_ACTOR: &str = "system";

/// Reason synthesised for the first entry of a new record.
pub const INITIAL_REASON: &str = "Initial status";

// ─── History ─────────────────────────────────────────────────────────────────

/// One append-only history entry. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub status:     TicketStatus,
  pub timestamp:  DateTime<Utc>,
  pub updated_by: String,
  pub reason:     String,
}

/// The tracked state of a single ticket.
///
/// Invariants maintained by the update engine and the stores:
/// `history` is non-empty, `current_status` equals the last entry's status,
/// `last_updated` equals the last entry's timestamp, and `is_active` is
/// `false` exactly when a `deleted` entry has been appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
  pub ticket_id:      String,
  pub current_status: TicketStatus,
  pub history:        Vec<HistoryEntry>,
  pub last_updated:   DateTime<Utc>,
  pub is_active:      bool,
}

impl StatusRecord {
  /// Build a fresh record from its first history entry.
  pub fn from_first_entry(ticket_id: &str, entry: HistoryEntry) -> Self {
    Self {
      ticket_id:      ticket_id.to_owned(),
      current_status: entry.status,
      last_updated:   entry.timestamp,
      is_active:      entry.status != TicketStatus::Deleted,
      history:        vec![entry],
    }
  }

  pub fn last_entry(&self) -> Option<&HistoryEntry> {
    self.history.last()
  }
}

/// The reason written when a caller supplies none.
pub fn default_reason(from: TicketStatus, to: TicketStatus) -> String {
  if to == TicketStatus::Deleted {
    "Ticket deleted".to_owned()
  } else if from == to {
    format!("Status {to} reconfirmed")
  } else {
    format!("Status changed from {from} to {to}")
  }
}

// ─── Update input ────────────────────────────────────────────────────────────

/// Which boundary an update arrived through. Event-sourced updates are never
/// re-published to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
  Api,
  EventFeed,
}

/// A normalised status update, ready for the engine. Both the REST handlers
/// and the feed router produce these.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
  pub ticket_id:       String,
  pub status:          TicketStatus,
  pub updated_by:      String,
  /// Caller-supplied reason; a default is synthesised when absent.
  pub reason:          Option<String>,
  pub source:          UpdateSource,
  /// The caller marked this update as already relayed through the feed
  /// (e.g. the `fromMessageQueue` flag), so publishing it again would echo.
  pub already_relayed: bool,
}

impl UpdateRequest {
  pub fn api(
    ticket_id: impl Into<String>,
    status: TicketStatus,
    updated_by: impl Into<String>,
  ) -> Self {
    Self {
      ticket_id:       ticket_id.into(),
      status,
      updated_by:      updated_by.into(),
      reason:          None,
      source:          UpdateSource::Api,
      already_relayed: false,
    }
  }

  pub fn feed(
    ticket_id: impl Into<String>,
    status: TicketStatus,
    updated_by: impl Into<String>,
  ) -> Self {
    Self {
      ticket_id:       ticket_id.into(),
      status,
      updated_by:      updated_by.into(),
      reason:          None,
      source:          UpdateSource::EventFeed,
      already_relayed: false,
    }
  }

  /// Whether an outbound notification must be suppressed to avoid the
  /// feed -> tracker -> feed echo cycle.
  pub fn prevent_loop(&self) -> bool {
    self.source == UpdateSource::EventFeed || self.already_relayed
  }
}

// ─── Update outcome ──────────────────────────────────────────────────────────

/// What the engine did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
  /// First sighting of the ticket; a record was created.
  Created,
  /// The status moved along a valid edge.
  Transitioned,
  /// Same status re-asserted outside the duplicate window; audit entry
  /// appended.
  Reconfirmed,
  /// Suppressed as a near-in-time duplicate; nothing written.
  Duplicate,
  /// The ticket was soft-deleted.
  Deleted,
}

/// The engine's result for one applied update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
  /// The record as persisted after the update.
  pub record:   StatusRecord,
  pub kind:     UpdateKind,
  /// Whether an outbound status-change notification was published.
  pub notified: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(status: TicketStatus) -> HistoryEntry {
    HistoryEntry {
      status,
      timestamp: Utc::now(),
      updated_by: "alice".to_owned(),
      reason: "test".to_owned(),
    }
  }

  #[test]
  fn first_entry_builds_consistent_record() {
    let record = StatusRecord::from_first_entry("T-1", entry(TicketStatus::Open));
    assert_eq!(record.ticket_id, "T-1");
    assert_eq!(record.current_status, TicketStatus::Open);
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.last_updated, record.history[0].timestamp);
    assert!(record.is_active);
  }

  #[test]
  fn record_created_deleted_is_inactive() {
    let record =
      StatusRecord::from_first_entry("T-1", entry(TicketStatus::Deleted));
    assert!(!record.is_active);
  }

  #[test]
  fn default_reasons() {
    assert_eq!(
      default_reason(TicketStatus::Open, TicketStatus::InProgress),
      "Status changed from open to in_progress"
    );
    assert_eq!(
      default_reason(TicketStatus::Open, TicketStatus::Open),
      "Status open reconfirmed"
    );
    assert_eq!(
      default_reason(TicketStatus::Closed, TicketStatus::Deleted),
      "Ticket deleted"
    );
  }

  #[test]
  fn loop_prevention_covers_both_flags() {
    let feed = UpdateRequest::feed("T-1", TicketStatus::Open, "system");
    assert!(feed.prevent_loop());

    let mut api = UpdateRequest::api("T-1", TicketStatus::Open, "alice");
    assert!(!api.prevent_loop());
    api.already_relayed = true;
    assert!(api.prevent_loop());
  }

  #[test]
  fn wire_form_is_camel_case() {
    let record = StatusRecord::from_first_entry("T-1", entry(TicketStatus::Open));
    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("ticketId").is_some());
    assert!(json.get("currentStatus").is_some());
    assert!(json.get("lastUpdated").is_some());
    assert!(json.get("isActive").is_some());
    let first = &json["history"][0];
    assert!(first.get("updatedBy").is_some());
    assert_eq!(first["status"], "open");
  }
}
