//! SQL schema for the Minder SQLite store.
//!
//! Applied on every connection open; `PRAGMA user_version` marks the
//! current revision so later migrations have something to key off.

/// Complete DDL, safe to re-run (`CREATE TABLE IF NOT EXISTS` throughout).
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per tracked ticket. The status/timestamp columns are denormalised
-- from the newest history row and are updated in the same transaction that
-- inserts it.
CREATE TABLE IF NOT EXISTS tickets (
    ticket_id      TEXT PRIMARY KEY,
    current_status TEXT NOT NULL,      -- 'open' | 'in_progress' | 'resolved' | 'closed' | 'deleted'
    is_active      INTEGER NOT NULL,   -- 0 once a 'deleted' entry lands; never set back to 1
    last_updated   TEXT NOT NULL       -- ISO 8601 UTC; equals the newest history timestamp
);

-- Append-only: rows are inserted and read back, never updated or deleted.
CREATE TABLE IF NOT EXISTS status_history (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id  TEXT NOT NULL REFERENCES tickets(ticket_id),
    status     TEXT NOT NULL,
    timestamp  TEXT NOT NULL,          -- ISO 8601 UTC
    updated_by TEXT NOT NULL,
    reason     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_ticket_idx    ON status_history(ticket_id);
CREATE INDEX IF NOT EXISTS history_timestamp_idx ON status_history(ticket_id, timestamp);
CREATE INDEX IF NOT EXISTS tickets_updated_idx   ON tickets(last_updated);

PRAGMA user_version = 1;
";
