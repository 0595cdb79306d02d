//! SQL schema for the Bazaar SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Raw source records, append-only. `record_id` preserves insertion order,
-- which drill-down selection depends on.
CREATE TABLE IF NOT EXISTS source_records (
    record_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    store_id    TEXT NOT NULL,
    kind        TEXT NOT NULL,   -- 'product' | 'promotion' | 'view_sample'
    body        TEXT NOT NULL,   -- raw JSON object, uninterpreted
    recorded_at TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS source_records_store_idx
    ON source_records(store_id, record_id);

PRAGMA user_version = 1;
";
