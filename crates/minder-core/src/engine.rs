//! The update engine — the only writer of status records.
//!
//! Every mutation, whether it arrived over REST or off the event feed, funnels
//! through [`UpdateEngine::apply`]. The engine owns the decision sequence:
//!
//! 1. unknown ticket: create the record;
//! 2. inactive record: reject;
//! 3. deletion: append, bypassing the duplicate check;
//! 4. near-in-time duplicate: absorb without writing;
//! 5. same status re-asserted: append an audit entry;
//! 6. otherwise: validate the transition and append.
//!
//! Steps that commit an entry then decide whether to publish it outbound;
//! feed-sourced and already-relayed updates are never re-published.
//!
//! Updates to the same ticket are serialised on a per-ticket lock, so handler
//! retries and concurrent API calls cannot interleave their read-modify-write
//! cycles. Replaying the same update is safe: the first application wins and
//! the replay is absorbed as a duplicate or rejected by the transition table.

use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
  dedup::{Candidate, is_recent_duplicate},
  error::{Error, Result},
  notify::{Notifier, StatusChange},
  record::{
    HistoryEntry, INITIAL_REASON, StatusRecord, UpdateKind, UpdateOutcome,
    UpdateRequest, UpdateSource, default_reason,
  },
  status::TicketStatus,
  store::{HistoryQuery, LatestUpdate, StatusStore, StatusSummary},
  transition::is_valid_transition,
};

/// Applies status updates against a [`StatusStore`] and publishes committed
/// changes through a [`Notifier`].
pub struct UpdateEngine<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
  locks:    Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S, N> UpdateEngine<S, N>
where
  S: StatusStore,
  N: Notifier,
{
  pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
    Self {
      store,
      notifier,
      locks: Mutex::new(HashMap::new()),
    }
  }

  /// The lock handle for one ticket. Handles are kept for the lifetime of the
  /// engine; the set of live tickets is small enough not to reap.
  async fn ticket_lock(&self, ticket_id: &str) -> Arc<Mutex<()>> {
    let mut locks = self.locks.lock().await;
    locks.entry(ticket_id.to_owned()).or_default().clone()
  }

  // ─── Writes ───────────────────────────────────────────────────────────────

  /// Apply one update end-to-end and report what was done.
  pub async fn apply(&self, req: UpdateRequest) -> Result<UpdateOutcome> {
    let lock = self.ticket_lock(&req.ticket_id).await;
    let _guard = lock.lock().await;

    let ticket_id = req.ticket_id.clone();
    let result = self.apply_locked(req).await;
    if let Err(error) = &result {
      if error.is_retryable() {
        tracing::error!(ticket_id = %ticket_id, error = %error, "status update failed");
      } else {
        tracing::debug!(ticket_id = %ticket_id, error = %error, "status update rejected");
      }
    }
    result
  }

  async fn apply_locked(&self, req: UpdateRequest) -> Result<UpdateOutcome> {
    let Some(record) = self
      .store
      .get(&req.ticket_id)
      .await
      .map_err(Error::store)?
    else {
      return self.create_record(&req).await;
    };

    if !record.is_active {
      return Err(Error::InvalidTransition {
        from: record.current_status,
        to:   req.status,
      });
    }

    // Entry timestamps stay monotone per ticket even if the wall clock steps
    // backwards between updates.
    let now = Utc::now().max(record.last_updated);
    let reason = req
      .reason
      .clone()
      .unwrap_or_else(|| default_reason(record.current_status, req.status));

    if req.status == TicketStatus::Deleted {
      return self.delete_record(&req, reason, now).await;
    }

    let candidate = Candidate {
      status:     req.status,
      updated_by: &req.updated_by,
      reason:     &reason,
      now,
    };
    if is_recent_duplicate(&record, &candidate, req.source) {
      tracing::debug!(
        ticket_id = %req.ticket_id,
        status = %req.status,
        "duplicate update absorbed"
      );
      return Ok(UpdateOutcome {
        record,
        kind: UpdateKind::Duplicate,
        notified: false,
      });
    }

    if req.status == record.current_status {
      let entry = self.entry_for(&req, reason, now);
      let record = self
        .store
        .append(&req.ticket_id, entry.clone())
        .await
        .map_err(Error::store)?;
      // Outside the duplicate window the re-assertion is audit-worthy, but
      // only API callers are notified; echoing feed traffic back out would
      // loop.
      let notified = self
        .publish(&req, &entry, req.source == UpdateSource::Api)
        .await?;
      return Ok(UpdateOutcome {
        record,
        kind: UpdateKind::Reconfirmed,
        notified,
      });
    }

    if !is_valid_transition(&record, req.status) {
      return Err(Error::InvalidTransition {
        from: record.current_status,
        to:   req.status,
      });
    }

    let entry = self.entry_for(&req, reason, now);
    let record = self
      .store
      .append(&req.ticket_id, entry.clone())
      .await
      .map_err(Error::store)?;
    let notified = self.publish(&req, &entry, true).await?;
    Ok(UpdateOutcome {
      record,
      kind: UpdateKind::Transitioned,
      notified,
    })
  }

  /// First sighting of a ticket: create its record with whatever status the
  /// update carries.
  async fn create_record(&self, req: &UpdateRequest) -> Result<UpdateOutcome> {
    let entry = HistoryEntry {
      status:     req.status,
      timestamp:  Utc::now(),
      updated_by: req.updated_by.clone(),
      reason:     req
        .reason
        .clone()
        .unwrap_or_else(|| INITIAL_REASON.to_owned()),
    };
    let record = self
      .store
      .create(&req.ticket_id, entry.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(
      ticket_id = %req.ticket_id,
      status = %req.status,
      "status record created"
    );
    let notified = self.publish(req, &entry, true).await?;
    Ok(UpdateOutcome {
      record,
      kind: UpdateKind::Created,
      notified,
    })
  }

  /// Soft-delete: always appended (never deduplicated), flips the record
  /// inactive.
  async fn delete_record(
    &self,
    req: &UpdateRequest,
    reason: String,
    now: DateTime<Utc>,
  ) -> Result<UpdateOutcome> {
    let entry = self.entry_for(req, reason, now);
    let record = self
      .store
      .append(&req.ticket_id, entry.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(ticket_id = %req.ticket_id, "status record deleted");
    let notified = self.publish(req, &entry, true).await?;
    Ok(UpdateOutcome {
      record,
      kind: UpdateKind::Deleted,
      notified,
    })
  }

  fn entry_for(
    &self,
    req: &UpdateRequest,
    reason: String,
    now: DateTime<Utc>,
  ) -> HistoryEntry {
    HistoryEntry {
      status: req.status,
      timestamp: now,
      updated_by: req.updated_by.clone(),
      reason,
    }
  }

  /// Publish the committed entry outbound, unless this update must not be
  /// notified (`notify == false`) or re-publishing would echo feed traffic.
  ///
  /// The entry is already durable by the time this runs; a notifier failure
  /// surfaces as [`Error::Notify`] but does not undo the write.
  async fn publish(
    &self,
    req: &UpdateRequest,
    entry: &HistoryEntry,
    notify: bool,
  ) -> Result<bool> {
    if !notify || req.prevent_loop() {
      return Ok(false);
    }
    let change = StatusChange::for_entry(&req.ticket_id, entry);
    self
      .notifier
      .publish(&change)
      .await
      .map_err(Error::notify)?;
    Ok(true)
  }

  // ─── Reads ────────────────────────────────────────────────────────────────

  pub async fn record(&self, ticket_id: &str) -> Result<Option<StatusRecord>> {
    self.store.get(ticket_id).await.map_err(|error| {
      tracing::error!(
        ticket_id = %ticket_id,
        error = %error,
        "record read failed"
      );
      Error::store(error)
    })
  }

  pub async fn history(
    &self,
    ticket_id: &str,
    query: &HistoryQuery,
  ) -> Result<Option<Vec<HistoryEntry>>> {
    self.store.history(ticket_id, query).await.map_err(|error| {
      tracing::error!(
        ticket_id = %ticket_id,
        error = %error,
        "history read failed"
      );
      Error::store(error)
    })
  }

  pub async fn snapshot(
    &self,
    ticket_ids: &[String],
  ) -> Result<BTreeMap<String, StatusSummary>> {
    self.store.snapshot(ticket_ids).await.map_err(|error| {
      tracing::error!(
        tickets = ticket_ids.len(),
        error = %error,
        "snapshot read failed"
      );
      Error::store(error)
    })
  }

  pub async fn latest(
    &self,
    ticket_ids: &[String],
    since: DateTime<Utc>,
  ) -> Result<BTreeMap<String, LatestUpdate>> {
    self
      .store
      .latest(ticket_ids, since)
      .await
      .map_err(|error| {
        tracing::error!(
          tickets = ticket_ids.len(),
          error = %error,
          "latest-updates read failed"
        );
        Error::store(error)
      })
  }
}
