//! Wire envelopes for the ticket event feed.
//!
//! Inbound events arrive as `{"type": "...", "data": {...}}` with camelCase
//! data fields. The `data` payload is a superset across all event types; each
//! type populates the fields it cares about and the router picks out what it
//! needs.

use minder_core::notify::StatusChange;
use serde::{Deserialize, Serialize};

/// The event type published for committed status changes.
pub const STATUS_UPDATED: &str = "ticket.status.updated";

// ─── Inbound ─────────────────────────────────────────────────────────────────

/// Known inbound event types. Anything unrecognised lands on `Unknown` and is
/// acknowledged without processing, so new upstream event types never wedge
/// the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketEventType {
  #[serde(rename = "ticket.created")]
  Created,
  #[serde(rename = "ticket.updated")]
  Updated,
  #[serde(rename = "ticket.status.changed")]
  StatusChanged,
  #[serde(rename = "ticket.assigned")]
  Assigned,
  #[serde(rename = "ticket.resolved")]
  Resolved,
  #[serde(rename = "ticket.deleted")]
  Deleted,
  #[serde(other)]
  Unknown,
}

/// One event off the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
  #[serde(rename = "type")]
  pub event_type: TicketEventType,
  pub data:       TicketEventData,
}

/// The shared payload shape. Only `id` is required; everything else is
/// per-event-type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEventData {
  pub id:              String,
  /// What the producer believed the prior status was. Informational only;
  /// transitions are validated against the stored record.
  pub previous_status: Option<String>,
  pub current_status:  Option<String>,
  pub assigned_to:     Option<String>,
  pub resolved_by:     Option<String>,
  pub closed_by:       Option<String>,
  pub updated_by:      Option<String>,
  pub reason:          Option<String>,
}

impl TicketEvent {
  pub fn new(event_type: TicketEventType, data: TicketEventData) -> Self {
    Self { event_type, data }
  }
}

// ─── Outbound ────────────────────────────────────────────────────────────────

/// The envelope published back to the feed for committed status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdatedEvent {
  #[serde(rename = "type")]
  pub event_type: String,
  pub data:       StatusChange,
}

impl From<StatusChange> for StatusUpdatedEvent {
  fn from(change: StatusChange) -> Self {
    Self {
      event_type: STATUS_UPDATED.to_owned(),
      data:       change,
    }
  }
}
