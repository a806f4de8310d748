//! SQL schema for the libwall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One wall per location; rows are never updated.
CREATE TABLE IF NOT EXISTS walls (
    id           INTEGER PRIMARY KEY,
    context_id   INTEGER NOT NULL,
    component    TEXT    NOT NULL,
    area         TEXT    NOT NULL DEFAULT '',
    item_id      INTEGER NOT NULL DEFAULT 0,
    time_created INTEGER NOT NULL,   -- seconds since epoch
    UNIQUE (context_id, component, area, item_id)
);

-- Comments are strictly append-only. The (wall_id, seq_num) key arbitrates
-- concurrent sequence-number allocation.
CREATE TABLE IF NOT EXISTS comments (
    id           INTEGER PRIMARY KEY,
    wall_id      INTEGER NOT NULL REFERENCES walls(id),
    seq_num      INTEGER NOT NULL CHECK (seq_num > 0),
    content      TEXT    NOT NULL,
    format       INTEGER NOT NULL DEFAULT 0,
    user_id      INTEGER NOT NULL,
    time_created INTEGER NOT NULL,
    UNIQUE (wall_id, seq_num)
);

CREATE TABLE IF NOT EXISTS replies (
    id           INTEGER PRIMARY KEY,
    comment_id   INTEGER NOT NULL REFERENCES comments(id),
    content      TEXT    NOT NULL,
    user_id      INTEGER NOT NULL,
    time_created INTEGER NOT NULL
);

-- Author display data, maintained by the hosting platform.
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    full_name   TEXT    NOT NULL,
    picture_url TEXT,
    guest       INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS replies_comment_idx ON replies(comment_id, time_created);

PRAGMA user_version = 1;
";
