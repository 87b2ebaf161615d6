//! In-memory [`StatusStore`] backend.
//!
//! Backs the engine and API tests, and is handy for short-lived tooling. Not
//! durable; the SQLite backend is the production store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
  record::{HistoryEntry, StatusRecord},
  status::TicketStatus,
  store::{HistoryQuery, LatestUpdate, StatusStore, StatusSummary},
};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("ticket not found: {0}")]
  TicketNotFound(String),

  #[error("ticket already exists: {0}")]
  TicketExists(String),
}

/// A [`StatusStore`] holding everything in a `RwLock`ed map.
#[derive(Debug, Default)]
pub struct MemoryStore {
  records: RwLock<HashMap<String, StatusRecord>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn filter_history(
  record: &StatusRecord,
  query: &HistoryQuery,
) -> Vec<HistoryEntry> {
  let mut entries: Vec<HistoryEntry> = record
    .history
    .iter()
    .filter(|e| query.start_date.is_none_or(|start| e.timestamp >= start))
    .filter(|e| query.end_date.is_none_or(|end| e.timestamp <= end))
    .cloned()
    .collect();
  if let Some(limit) = query.limit {
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
  }
  entries
}

impl StatusStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn get(
    &self,
    ticket_id: &str,
  ) -> Result<Option<StatusRecord>, Self::Error> {
    Ok(self.records.read().await.get(ticket_id).cloned())
  }

  async fn create(
    &self,
    ticket_id: &str,
    entry: HistoryEntry,
  ) -> Result<StatusRecord, Self::Error> {
    let mut records = self.records.write().await;
    if records.contains_key(ticket_id) {
      return Err(MemoryStoreError::TicketExists(ticket_id.to_owned()));
    }
    let record = StatusRecord::from_first_entry(ticket_id, entry);
    records.insert(ticket_id.to_owned(), record.clone());
    Ok(record)
  }

  async fn append(
    &self,
    ticket_id: &str,
    entry: HistoryEntry,
  ) -> Result<StatusRecord, Self::Error> {
    let mut records = self.records.write().await;
    let record = records
      .get_mut(ticket_id)
      .ok_or_else(|| MemoryStoreError::TicketNotFound(ticket_id.to_owned()))?;
    record.current_status = entry.status;
    record.last_updated = entry.timestamp;
    // Sticky: once a record goes inactive it never comes back.
    record.is_active = record.is_active && entry.status != TicketStatus::Deleted;
    record.history.push(entry);
    Ok(record.clone())
  }

  async fn history(
    &self,
    ticket_id: &str,
    query: &HistoryQuery,
  ) -> Result<Option<Vec<HistoryEntry>>, Self::Error> {
    let records = self.records.read().await;
    Ok(records.get(ticket_id).map(|r| filter_history(r, query)))
  }

  async fn snapshot(
    &self,
    ticket_ids: &[String],
  ) -> Result<BTreeMap<String, StatusSummary>, Self::Error> {
    let records = self.records.read().await;
    let mut out = BTreeMap::new();
    for id in ticket_ids {
      if let Some(record) = records.get(id) {
        out.insert(id.clone(), StatusSummary {
          current_status: record.current_status,
          last_updated:   record.last_updated,
        });
      }
    }
    Ok(out)
  }

  async fn latest(
    &self,
    ticket_ids: &[String],
    since: DateTime<Utc>,
  ) -> Result<BTreeMap<String, LatestUpdate>, Self::Error> {
    let records = self.records.read().await;
    let mut out = BTreeMap::new();
    for id in ticket_ids {
      let Some(record) = records.get(id) else {
        continue;
      };
      if record.last_updated <= since {
        continue;
      }
      let Some(last) = record.last_entry() else {
        continue;
      };
      out.insert(id.clone(), LatestUpdate {
        current_status: record.current_status,
        last_updated:   record.last_updated,
        last_entry:     last.clone(),
      });
    }
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn entry_at(
    status: TicketStatus,
    at: DateTime<Utc>,
    reason: &str,
  ) -> HistoryEntry {
    HistoryEntry {
      status,
      timestamp: at,
      updated_by: "alice".to_owned(),
      reason: reason.to_owned(),
    }
  }

  async fn seeded_store(base: DateTime<Utc>) -> MemoryStore {
    let store = MemoryStore::new();
    store
      .create("T-1", entry_at(TicketStatus::Open, base, "opened"))
      .await
      .unwrap();
    store
      .append(
        "T-1",
        entry_at(
          TicketStatus::InProgress,
          base + Duration::minutes(10),
          "picked up",
        ),
      )
      .await
      .unwrap();
    store
      .append(
        "T-1",
        entry_at(
          TicketStatus::Resolved,
          base + Duration::minutes(20),
          "fixed",
        ),
      )
      .await
      .unwrap();
    store
  }

  #[tokio::test]
  async fn create_then_get_round_trips() {
    let store = MemoryStore::new();
    let created = store
      .create("T-1", entry_at(TicketStatus::Open, Utc::now(), "opened"))
      .await
      .unwrap();
    let fetched = store.get("T-1").await.unwrap().unwrap();
    assert_eq!(fetched.current_status, created.current_status);
    assert_eq!(fetched.history.len(), 1);
    assert!(store.get("T-2").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn create_rejects_existing_ticket() {
    let store = MemoryStore::new();
    let entry = entry_at(TicketStatus::Open, Utc::now(), "opened");
    store.create("T-1", entry.clone()).await.unwrap();
    let err = store.create("T-1", entry).await.unwrap_err();
    assert!(matches!(err, MemoryStoreError::TicketExists(_)));
  }

  #[tokio::test]
  async fn append_rejects_unknown_ticket() {
    let store = MemoryStore::new();
    let err = store
      .append("T-404", entry_at(TicketStatus::Open, Utc::now(), "x"))
      .await
      .unwrap_err();
    assert!(matches!(err, MemoryStoreError::TicketNotFound(_)));
  }

  #[tokio::test]
  async fn append_keeps_denormalised_fields_in_step() {
    let base = Utc::now();
    let store = seeded_store(base).await;
    let record = store.get("T-1").await.unwrap().unwrap();
    assert_eq!(record.current_status, TicketStatus::Resolved);
    assert_eq!(record.last_updated, base + Duration::minutes(20));
    assert_eq!(record.history.len(), 3);
    assert!(record.is_active);
  }

  #[tokio::test]
  async fn deletion_is_sticky() {
    let base = Utc::now();
    let store = seeded_store(base).await;
    store
      .append(
        "T-1",
        entry_at(
          TicketStatus::Deleted,
          base + Duration::minutes(30),
          "gone",
        ),
      )
      .await
      .unwrap();
    let record = store.get("T-1").await.unwrap().unwrap();
    assert!(!record.is_active);
    assert_eq!(record.current_status, TicketStatus::Deleted);
  }

  #[tokio::test]
  async fn history_filters_by_date_range() {
    let base = Utc::now();
    let store = seeded_store(base).await;

    let all = store
      .history("T-1", &HistoryQuery::default())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(all.len(), 3);

    let middle = store
      .history("T-1", &HistoryQuery {
        start_date: Some(base + Duration::minutes(5)),
        end_date:   Some(base + Duration::minutes(15)),
        limit:      None,
      })
      .await
      .unwrap()
      .unwrap();
    assert_eq!(middle.len(), 1);
    assert_eq!(middle[0].status, TicketStatus::InProgress);
  }

  #[tokio::test]
  async fn history_limit_keeps_most_recent_oldest_first() {
    let base = Utc::now();
    let store = seeded_store(base).await;
    let capped = store
      .history("T-1", &HistoryQuery {
        limit: Some(2),
        ..Default::default()
      })
      .await
      .unwrap()
      .unwrap();
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].status, TicketStatus::InProgress);
    assert_eq!(capped[1].status, TicketStatus::Resolved);
  }

  #[tokio::test]
  async fn history_is_none_for_unknown_ticket() {
    let store = MemoryStore::new();
    assert!(
      store
        .history("T-404", &HistoryQuery::default())
        .await
        .unwrap()
        .is_none()
    );
  }

  #[tokio::test]
  async fn snapshot_skips_unknown_tickets() {
    let base = Utc::now();
    let store = seeded_store(base).await;
    let ids = vec!["T-1".to_owned(), "T-404".to_owned()];
    let snap = store.snapshot(&ids).await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap["T-1"].current_status, TicketStatus::Resolved);
  }

  #[tokio::test]
  async fn latest_honours_the_since_cutoff() {
    let base = Utc::now();
    let store = seeded_store(base).await;
    let ids = vec!["T-1".to_owned()];

    let fresh = store
      .latest(&ids, base + Duration::minutes(15))
      .await
      .unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh["T-1"].last_entry.reason, "fixed");

    let stale = store
      .latest(&ids, base + Duration::minutes(20))
      .await
      .unwrap();
    assert!(stale.is_empty());
  }
}
