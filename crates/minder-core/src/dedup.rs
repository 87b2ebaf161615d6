//! Near-in-time duplicate suppression.
//!
//! Producers retry, and the same change often arrives twice within a second or
//! two through different paths. An update that matches the record's last entry
//! closely enough, soon enough, is absorbed without writing anything.
//!
//! The check is advisory: it only ever suppresses a same-status re-assertion.
//! A different status value is never blocked here, and deletions bypass the
//! check entirely.

use chrono::{DateTime, Duration, Utc};

use crate::{
  record::{StatusRecord, UpdateSource},
  status::TicketStatus,
};

/// Updates inside this window of the last entry are duplicate candidates.
pub const DEDUP_WINDOW_SECS: i64 = 5;

/// A prospective update, with its reason already resolved (defaulted if the
/// caller supplied none), compared against the record's last entry.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
  pub status:     TicketStatus,
  pub updated_by: &'a str,
  pub reason:     &'a str,
  pub now:        DateTime<Utc>,
}

/// Loose reason comparison: equal, or one is a non-empty substring of the
/// other. Two retries of the same logical change rarely carry byte-identical
/// reasons (one side truncates, the other appends a suffix).
pub fn reasons_match(a: &str, b: &str) -> bool {
  a == b
    || (!a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a)))
}

/// Whether `candidate` repeats the record's last entry closely enough to be
/// absorbed.
///
/// All of the following must hold:
/// - the last entry is younger than [`DEDUP_WINDOW_SECS`];
/// - the status values are identical;
/// - the actors match (only enforced for API-sourced updates; feed retries
///   routinely rewrite the actor field);
/// - the reasons match per [`reasons_match`].
pub fn is_recent_duplicate(
  record: &StatusRecord,
  candidate: &Candidate<'_>,
  source: UpdateSource,
) -> bool {
  let Some(last) = record.last_entry() else {
    return false;
  };

  if candidate.now - last.timestamp >= Duration::seconds(DEDUP_WINDOW_SECS) {
    return false;
  }
  if candidate.status != last.status {
    return false;
  }
  if source == UpdateSource::Api && candidate.updated_by != last.updated_by {
    return false;
  }
  reasons_match(candidate.reason, &last.reason)
}
