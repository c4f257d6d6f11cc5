//! SQL schema for the absensi SQLite store.
//!
//! Executed once after the bootstrapper reports the database reachable.
//! There is no migration versioning.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- AUTOINCREMENT guarantees ids are never reused after deletion.
CREATE TABLE IF NOT EXISTS absensi (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    nrp         TEXT NOT NULL CHECK (length(nrp)  BETWEEN 1 AND 20),
    nama        TEXT NOT NULL CHECK (length(nama) BETWEEN 1 AND 100),
    recorded_at TEXT NOT NULL,   -- RFC 3339 UTC, microseconds; server-assigned
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS absensi_recorded_idx ON absensi(recorded_at);
";
