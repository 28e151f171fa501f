//! SQL schema for the Manna SQLite store.
//!
//! Remote tables are not modelled one-to-one: each row is a JSON document in
//! `records`, keyed by table name and row id. Filters are evaluated with
//! `json_extract`, which is what lets the same `Query` serve every table.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS records (
    tbl   TEXT NOT NULL,
    id    TEXT NOT NULL,
    data  TEXT NOT NULL,          -- JSON object, always carries \"id\"
    PRIMARY KEY (tbl, id)
);

CREATE INDEX IF NOT EXISTS records_tbl_idx ON records(tbl);

-- Only the SHA-256 of a session token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    email       TEXT,
    created_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
