//! SQL schema for the Hearsay SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS stories (
    story_id    TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    body        TEXT NOT NULL,
    category    TEXT NOT NULL,
    location    TEXT NOT NULL,
    persona     TEXT NOT NULL,
    phase       TEXT NOT NULL,             -- duplicates state_json.current
    state_json  TEXT,                      -- phase-state blob; may be NULL
    created_at  TEXT NOT NULL,             -- ISO 8601 UTC
    updated_at  TEXT NOT NULL,
    views       INTEGER NOT NULL DEFAULT 0,
    revision    INTEGER NOT NULL DEFAULT 0 -- guards phase/blob writes
);

-- Evidence rows are immutable once created.
-- No UPDATE is ever issued against this table; rows only disappear when
-- their story is deleted.
CREATE TABLE IF NOT EXISTS evidence (
    evidence_id TEXT PRIMARY KEY,
    story_id    TEXT NOT NULL REFERENCES stories(story_id) ON DELETE CASCADE,
    kind        TEXT NOT NULL,   -- 'image' | 'audio' | 'text'
    reference   TEXT NOT NULL,   -- opaque artifact reference
    description TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  TEXT PRIMARY KEY,
    story_id    TEXT NOT NULL REFERENCES stories(story_id) ON DELETE CASCADE,
    author      TEXT NOT NULL,   -- JSON-encoded Author
    body        TEXT NOT NULL,
    posted_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS stories_phase_idx  ON stories(phase);
CREATE INDEX IF NOT EXISTS evidence_story_idx ON evidence(story_id);
CREATE INDEX IF NOT EXISTS comments_story_idx ON comments(story_id);

PRAGMA user_version = 1;
";
