//! The status transition table.
//!
//! Transitions are validated against the record's stored status, never against
//! anything the caller claims. `deleted` is reachable from every active status
//! and is terminal; a deleted record accepts nothing further.

use crate::{record::StatusRecord, status::TicketStatus};

/// The statuses reachable from `from` by a plain (non-delete) transition.
pub fn allowed_targets(from: TicketStatus) -> &'static [TicketStatus] {
  match from {
    TicketStatus::Open => {
      &[TicketStatus::InProgress, TicketStatus::Closed]
    }
    TicketStatus::InProgress => {
      &[TicketStatus::Resolved, TicketStatus::Closed]
    }
    TicketStatus::Resolved => {
      &[TicketStatus::Closed, TicketStatus::InProgress]
    }
    TicketStatus::Closed => &[],
    TicketStatus::Deleted => &[],
  }
}

/// Whether `record` may move to `new_status`.
///
/// An inactive (deleted) record rejects everything. Deletion itself is always
/// permitted on an active record, regardless of its current status.
pub fn is_valid_transition(
  record: &StatusRecord,
  new_status: TicketStatus,
) -> bool {
  if !record.is_active {
    return false;
  }
  if new_status == TicketStatus::Deleted {
    return true;
  }
  allowed_targets(record.current_status).contains(&new_status)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::record::HistoryEntry;

  const ALL: [TicketStatus; 5] = [
    TicketStatus::Open,
    TicketStatus::InProgress,
    TicketStatus::Resolved,
    TicketStatus::Closed,
    TicketStatus::Deleted,
  ];

  fn record_with(status: TicketStatus) -> StatusRecord {
    StatusRecord::from_first_entry(
      "T-1",
      HistoryEntry {
        status,
        timestamp: Utc::now(),
        updated_by: "alice".to_owned(),
        reason: "test".to_owned(),
      },
    )
  }

  #[test]
  fn full_transition_table() {
    let allowed = |from, to| {
      matches!(
        (from, to),
        (TicketStatus::Open, TicketStatus::InProgress)
          | (TicketStatus::Open, TicketStatus::Closed)
          | (TicketStatus::InProgress, TicketStatus::Resolved)
          | (TicketStatus::InProgress, TicketStatus::Closed)
          | (TicketStatus::Resolved, TicketStatus::Closed)
          | (TicketStatus::Resolved, TicketStatus::InProgress)
      )
    };

    for from in ALL {
      for to in ALL {
        if to == TicketStatus::Deleted {
          continue;
        }
        assert_eq!(
          is_valid_transition(&record_with(from), to),
          allowed(from, to),
          "{from} -> {to}"
        );
      }
    }
  }

  #[test]
  fn delete_is_allowed_from_every_active_status() {
    for from in ALL {
      if from == TicketStatus::Deleted {
        continue;
      }
      assert!(is_valid_transition(&record_with(from), TicketStatus::Deleted));
    }
  }

  #[test]
  fn inactive_record_rejects_everything() {
    let record = record_with(TicketStatus::Deleted);
    assert!(!record.is_active);
    for to in ALL {
      assert!(!is_valid_transition(&record, to));
    }
  }

  #[test]
  fn closed_allows_only_delete() {
    let record = record_with(TicketStatus::Closed);
    for to in ALL {
      let want = to == TicketStatus::Deleted;
      assert_eq!(is_valid_transition(&record, to), want, "closed -> {to}");
    }
  }
}
