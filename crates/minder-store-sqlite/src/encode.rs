//! Conversions between the domain types and the TEXT/INTEGER forms the
//! SQLite columns hold.
//!
//! All timestamps are stored as RFC 3339 strings in UTC, which keeps their
//! lexicographic order aligned with chronological order so SQL range filters
//! work on the raw text. Statuses are stored in their canonical snake_case
//! form.

use chrono::{DateTime, Utc};
use minder_core::{
  record::{HistoryEntry, StatusRecord},
  status::TicketStatus,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── TicketStatus ────────────────────────────────────────────────────────────

pub fn encode_status(status: TicketStatus) -> &'static str {
  // strum's IntoStaticStr yields the same snake_case form the parser accepts.
  status.into()
}

pub fn decode_status(s: &str) -> Result<TicketStatus> {
  Ok(TicketStatus::parse(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `status_history` row.
pub struct RawEntry {
  pub status:     String,
  pub timestamp:  String,
  pub updated_by: String,
  pub reason:     String,
}

impl RawEntry {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      status:     decode_status(&self.status)?,
      timestamp:  decode_dt(&self.timestamp)?,
      updated_by: self.updated_by,
      reason:     self.reason,
    })
  }
}

/// Raw strings read directly from a `tickets` row.
pub struct RawTicket {
  pub ticket_id:      String,
  pub current_status: String,
  pub is_active:      bool,
  pub last_updated:   String,
}

impl RawTicket {
  pub fn into_record(self, raw_entries: Vec<RawEntry>) -> Result<StatusRecord> {
    let history = raw_entries
      .into_iter()
      .map(RawEntry::into_entry)
      .collect::<Result<Vec<_>>>()?;

    Ok(StatusRecord {
      ticket_id:      self.ticket_id,
      current_status: decode_status(&self.current_status)?,
      history,
      last_updated:   decode_dt(&self.last_updated)?,
      is_active:      self.is_active,
    })
  }
}
