//! [`SqliteStore`] — the SQLite implementation of [`StatusStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use minder_core::{
  record::{HistoryEntry, StatusRecord},
  status::TicketStatus,
  store::{HistoryQuery, LatestUpdate, StatusStore, StatusSummary},
};

use crate::{
  Error, Result,
  encode::{RawEntry, RawTicket, decode_dt, decode_status, encode_dt, encode_status},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Minder status store backed by a single SQLite file.
///
/// Clones share the same underlying connection handle.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the database at `path`, creating the file and schema as needed.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh `:memory:` database, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Reload a record that is known to exist (just created or appended to).
  async fn reload(&self, ticket_id: &str) -> Result<StatusRecord> {
    self
      .get(ticket_id)
      .await?
      .ok_or_else(|| Error::TicketNotFound(ticket_id.to_owned()))
  }
}

// ─── StatusStore impl ────────────────────────────────────────────────────────

impl StatusStore for SqliteStore {
  type Error = Error;

  async fn get(&self, ticket_id: &str) -> Result<Option<StatusRecord>> {
    let id = ticket_id.to_owned();

    let raw: Option<(RawTicket, Vec<RawEntry>)> = self
      .conn
      .call(move |conn| {
        let ticket = conn
          .query_row(
            "SELECT ticket_id, current_status, is_active, last_updated
             FROM tickets WHERE ticket_id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawTicket {
                ticket_id:      row.get(0)?,
                current_status: row.get(1)?,
                is_active:      row.get(2)?,
                last_updated:   row.get(3)?,
              })
            },
          )
          .optional()?;

        let Some(ticket) = ticket else { return Ok(None) };

        let mut stmt = conn.prepare(
          "SELECT status, timestamp, updated_by, reason
           FROM status_history WHERE ticket_id = ?1 ORDER BY seq ASC",
        )?;
        let entries = stmt
          .query_map(rusqlite::params![ticket.ticket_id], |row| {
            Ok(RawEntry {
              status:     row.get(0)?,
              timestamp:  row.get(1)?,
              updated_by: row.get(2)?,
              reason:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((ticket, entries)))
      })
      .await?;

    raw
      .map(|(ticket, entries)| ticket.into_record(entries))
      .transpose()
  }

  async fn create(
    &self,
    ticket_id: &str,
    entry: HistoryEntry,
  ) -> Result<StatusRecord> {
    let id         = ticket_id.to_owned();
    let status_str = encode_status(entry.status).to_owned();
    let at_str     = encode_dt(entry.timestamp);
    let is_active  = entry.status != TicketStatus::Deleted;
    let updated_by = entry.updated_by;
    let reason     = entry.reason;

    let created: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM tickets WHERE ticket_id = ?1",
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO tickets (ticket_id, current_status, is_active, last_updated)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id, status_str, is_active, at_str],
        )?;
        tx.execute(
          "INSERT INTO status_history (ticket_id, status, timestamp, updated_by, reason)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id, status_str, at_str, updated_by, reason],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::TicketExists(ticket_id.to_owned()));
    }
    self.reload(ticket_id).await
  }

  async fn append(
    &self,
    ticket_id: &str,
    entry: HistoryEntry,
  ) -> Result<StatusRecord> {
    let id           = ticket_id.to_owned();
    let status_str   = encode_status(entry.status).to_owned();
    let at_str       = encode_dt(entry.timestamp);
    let stays_active = entry.status != TicketStatus::Deleted;
    let updated_by   = entry.updated_by;
    let reason       = entry.reason;

    let found: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM tickets WHERE ticket_id = ?1",
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO status_history (ticket_id, status, timestamp, updated_by, reason)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id, status_str, at_str, updated_by, reason],
        )?;
        // is_active is sticky: AND-ing keeps a deleted ticket inactive no
        // matter what is appended afterwards.
        tx.execute(
          "UPDATE tickets
           SET current_status = ?2, is_active = is_active AND ?3, last_updated = ?4
           WHERE ticket_id = ?1",
          rusqlite::params![id, status_str, stays_active, at_str],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::TicketNotFound(ticket_id.to_owned()));
    }
    self.reload(ticket_id).await
  }

  async fn history(
    &self,
    ticket_id: &str,
    query: &HistoryQuery,
  ) -> Result<Option<Vec<HistoryEntry>>> {
    let id        = ticket_id.to_owned();
    let start_str = query.start_date.map(encode_dt);
    let end_str   = query.end_date.map(encode_dt);
    // SQLite treats LIMIT -1 as unbounded.
    let limit_val = query.limit.map_or(-1, |n| n as i64);

    let raws: Option<Vec<RawEntry>> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM tickets WHERE ticket_id = ?1",
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        // Newest-first plus LIMIT keeps the most recent N; the caller-facing
        // order is restored below.
        let mut stmt = conn.prepare(
          "SELECT status, timestamp, updated_by, reason
           FROM status_history
           WHERE ticket_id = ?1
             AND (?2 IS NULL OR timestamp >= ?2)
             AND (?3 IS NULL OR timestamp <= ?3)
           ORDER BY seq DESC
           LIMIT ?4",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![id, start_str, end_str, limit_val],
            |row| {
              Ok(RawEntry {
                status:     row.get(0)?,
                timestamp:  row.get(1)?,
                updated_by: row.get(2)?,
                reason:     row.get(3)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(rows))
      })
      .await?;

    let Some(raws) = raws else { return Ok(None) };
    let mut entries = raws
      .into_iter()
      .map(RawEntry::into_entry)
      .collect::<Result<Vec<_>>>()?;
    entries.reverse();
    Ok(Some(entries))
  }

  async fn snapshot(
    &self,
    ticket_ids: &[String],
  ) -> Result<BTreeMap<String, StatusSummary>> {
    let ids = ticket_ids.to_vec();

    let raws: Vec<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ticket_id, current_status, last_updated
           FROM tickets WHERE ticket_id = ?1",
        )?;
        let mut out = Vec::new();
        for id in &ids {
          let row = stmt
            .query_row(rusqlite::params![id], |row| {
              Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()?;
          if let Some(row) = row {
            out.push(row);
          }
        }
        Ok(out)
      })
      .await?;

    let mut out = BTreeMap::new();
    for (id, status_str, updated_str) in raws {
      out.insert(id, StatusSummary {
        current_status: decode_status(&status_str)?,
        last_updated:   decode_dt(&updated_str)?,
      });
    }
    Ok(out)
  }

  async fn latest(
    &self,
    ticket_ids: &[String],
    since: DateTime<Utc>,
  ) -> Result<BTreeMap<String, LatestUpdate>> {
    let ids       = ticket_ids.to_vec();
    let since_str = encode_dt(since);

    let raws: Vec<(String, String, String, RawEntry)> = self
      .conn
      .call(move |conn| {
        let mut ticket_stmt = conn.prepare(
          "SELECT current_status, last_updated
           FROM tickets WHERE ticket_id = ?1 AND last_updated > ?2",
        )?;
        let mut entry_stmt = conn.prepare(
          "SELECT status, timestamp, updated_by, reason
           FROM status_history WHERE ticket_id = ?1 ORDER BY seq DESC LIMIT 1",
        )?;

        let mut out = Vec::new();
        for id in &ids {
          let ticket: Option<(String, String)> = ticket_stmt
            .query_row(rusqlite::params![id, since_str], |row| {
              Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;
          let Some((status_str, updated_str)) = ticket else {
            continue;
          };
          let entry = entry_stmt
            .query_row(rusqlite::params![id], |row| {
              Ok(RawEntry {
                status:     row.get(0)?,
                timestamp:  row.get(1)?,
                updated_by: row.get(2)?,
                reason:     row.get(3)?,
              })
            })
            .optional()?;
          if let Some(entry) = entry {
            out.push((id.clone(), status_str, updated_str, entry));
          }
        }
        Ok(out)
      })
      .await?;

    let mut out = BTreeMap::new();
    for (id, status_str, updated_str, raw_entry) in raws {
      out.insert(id, LatestUpdate {
        current_status: decode_status(&status_str)?,
        last_updated:   decode_dt(&updated_str)?,
        last_entry:     raw_entry.into_entry()?,
      });
    }
    Ok(out)
  }
}
