//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, Utc};
use minder_core::{
  record::HistoryEntry,
  status::TicketStatus,
  store::{HistoryQuery, StatusStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn entry_at(
  status: TicketStatus,
  at: DateTime<Utc>,
  updated_by: &str,
  reason: &str,
) -> HistoryEntry {
  HistoryEntry {
    status,
    timestamp: at,
    updated_by: updated_by.to_owned(),
    reason: reason.to_owned(),
  }
}

/// T-1 with open -> in_progress -> resolved at base, +10m, +20m.
async fn seeded(s: &SqliteStore, base: DateTime<Utc>) {
  s.create("T-1", entry_at(TicketStatus::Open, base, "alice", "opened"))
    .await
    .unwrap();
  s.append(
    "T-1",
    entry_at(
      TicketStatus::InProgress,
      base + Duration::minutes(10),
      "bob",
      "picked up",
    ),
  )
  .await
  .unwrap();
  s.append(
    "T-1",
    entry_at(
      TicketStatus::Resolved,
      base + Duration::minutes(20),
      "bob",
      "fixed",
    ),
  )
  .await
  .unwrap();
}

// ─── Create and get ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_round_trips() {
  let s = store().await;
  let base = Utc::now();

  let created = s
    .create("T-1", entry_at(TicketStatus::Open, base, "alice", "opened"))
    .await
    .unwrap();
  assert_eq!(created.ticket_id, "T-1");
  assert_eq!(created.current_status, TicketStatus::Open);
  assert!(created.is_active);
  assert_eq!(created.history.len(), 1);

  let fetched = s.get("T-1").await.unwrap().unwrap();
  assert_eq!(fetched.ticket_id, "T-1");
  assert_eq!(fetched.current_status, TicketStatus::Open);
  assert_eq!(fetched.last_updated, created.last_updated);
  assert_eq!(fetched.history.len(), 1);
  assert_eq!(fetched.history[0].updated_by, "alice");
  assert_eq!(fetched.history[0].reason, "opened");
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get("T-404").await.unwrap().is_none());
}

#[tokio::test]
async fn create_existing_ticket_errors() {
  let s = store().await;
  let entry = entry_at(TicketStatus::Open, Utc::now(), "alice", "opened");
  s.create("T-1", entry.clone()).await.unwrap();

  let err = s.create("T-1", entry).await.unwrap_err();
  assert!(matches!(err, crate::Error::TicketExists(_)));

  // The original record is intact.
  let record = s.get("T-1").await.unwrap().unwrap();
  assert_eq!(record.history.len(), 1);
}

#[tokio::test]
async fn create_with_deleted_status_is_inactive() {
  let s = store().await;
  s.create(
    "T-1",
    entry_at(TicketStatus::Deleted, Utc::now(), "admin", "gone"),
  )
  .await
  .unwrap();

  let record = s.get("T-1").await.unwrap().unwrap();
  assert!(!record.is_active);
  assert_eq!(record.current_status, TicketStatus::Deleted);
}

// ─── Append ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_updates_denormalised_columns() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  let record = s.get("T-1").await.unwrap().unwrap();
  assert_eq!(record.current_status, TicketStatus::Resolved);
  assert_eq!(record.last_updated, base + Duration::minutes(20));
  assert_eq!(record.history.len(), 3);
  assert!(record.is_active);

  // History comes back oldest-first.
  assert_eq!(record.history[0].status, TicketStatus::Open);
  assert_eq!(record.history[2].status, TicketStatus::Resolved);
}

#[tokio::test]
async fn append_to_unknown_ticket_errors() {
  let s = store().await;
  let err = s
    .append(
      "T-404",
      entry_at(TicketStatus::Open, Utc::now(), "alice", "x"),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::TicketNotFound(_)));
}

#[tokio::test]
async fn deletion_is_sticky() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  s.append(
    "T-1",
    entry_at(
      TicketStatus::Deleted,
      base + Duration::minutes(30),
      "admin",
      "gone",
    ),
  )
  .await
  .unwrap();

  let record = s.get("T-1").await.unwrap().unwrap();
  assert!(!record.is_active);
  assert_eq!(record.current_status, TicketStatus::Deleted);
  assert_eq!(record.history.len(), 4);
}

// ─── History queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn history_unfiltered_returns_everything_oldest_first() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  let entries = s
    .history("T-1", &HistoryQuery::default())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(entries.len(), 3);
  assert_eq!(entries[0].reason, "opened");
  assert_eq!(entries[2].reason, "fixed");
}

#[tokio::test]
async fn history_filters_by_date_range() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  let entries = s
    .history("T-1", &HistoryQuery {
      start_date: Some(base + Duration::minutes(5)),
      end_date:   Some(base + Duration::minutes(15)),
      limit:      None,
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].status, TicketStatus::InProgress);

  // Bounds are inclusive.
  let entries = s
    .history("T-1", &HistoryQuery {
      start_date: Some(base + Duration::minutes(10)),
      end_date:   Some(base + Duration::minutes(20)),
      limit:      None,
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn history_limit_keeps_most_recent() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  let entries = s
    .history("T-1", &HistoryQuery {
      limit: Some(2),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0].status, TicketStatus::InProgress);
  assert_eq!(entries[1].status, TicketStatus::Resolved);
}

#[tokio::test]
async fn history_for_unknown_ticket_is_none() {
  let s = store().await;
  let result = s.history("T-404", &HistoryQuery::default()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn history_empty_match_is_some_empty() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  let entries = s
    .history("T-1", &HistoryQuery {
      start_date: Some(base + Duration::hours(1)),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert!(entries.is_empty());
}

// ─── Snapshot and latest ─────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_returns_known_tickets_only() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;
  s.create(
    "T-2",
    entry_at(TicketStatus::Open, base + Duration::minutes(1), "carol", "opened"),
  )
  .await
  .unwrap();

  let ids = vec!["T-1".to_owned(), "T-2".to_owned(), "T-404".to_owned()];
  let snap = s.snapshot(&ids).await.unwrap();

  assert_eq!(snap.len(), 2);
  assert_eq!(snap["T-1"].current_status, TicketStatus::Resolved);
  assert_eq!(snap["T-2"].current_status, TicketStatus::Open);
  assert!(!snap.contains_key("T-404"));
}

#[tokio::test]
async fn latest_filters_on_the_cutoff() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;
  s.create(
    "T-2",
    entry_at(TicketStatus::Open, base + Duration::minutes(5), "carol", "opened"),
  )
  .await
  .unwrap();

  let ids = vec!["T-1".to_owned(), "T-2".to_owned()];

  // Cutoff before both: everything comes back with its last entry.
  let all = s.latest(&ids, base - Duration::minutes(1)).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all["T-1"].last_entry.reason, "fixed");
  assert_eq!(all["T-2"].last_entry.reason, "opened");

  // Cutoff between the two: only T-1 (updated at +20m) survives.
  let some = s.latest(&ids, base + Duration::minutes(10)).await.unwrap();
  assert_eq!(some.len(), 1);
  assert!(some.contains_key("T-1"));

  // Cutoff at the newest update: strict comparison drops everything.
  let none = s.latest(&ids, base + Duration::minutes(20)).await.unwrap();
  assert!(none.is_empty());
}

// ─── Persistence across handles ──────────────────────────────────────────────

#[tokio::test]
async fn clones_share_the_same_database() {
  let s = store().await;
  let base = Utc::now();
  seeded(&s, base).await;

  let other = s.clone();
  let record = other.get("T-1").await.unwrap().unwrap();
  assert_eq!(record.history.len(), 3);
}
