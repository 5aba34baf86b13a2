//! SQL schema for the ARCOP SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per request, one column per intake field.
-- Email is stored lowercased so the index serves case-insensitive lookup.
CREATE TABLE IF NOT EXISTS requests (
    id                  TEXT PRIMARY KEY,
    number              TEXT NOT NULL UNIQUE,
    submitted_at        TEXT NOT NULL,     -- ISO 8601 UTC
    kind                TEXT NOT NULL,     -- 'ACCESS' | 'RECTIFICATION' | ...
    status              TEXT NOT NULL,     -- state machine value
    full_name           TEXT NOT NULL,
    rut                 TEXT NOT NULL,     -- formatted, e.g. '12.345.678-5'
    email               TEXT NOT NULL,
    phone               TEXT,
    scope               TEXT NOT NULL,     -- 'ALL' | 'SPECIFIC'
    categories          TEXT NOT NULL DEFAULT '[]',  -- JSON array as text
    preferred_format    TEXT NOT NULL,     -- 'PDF' | 'CSV' | 'JSON'
    identity_validated  TEXT NOT NULL DEFAULT 'FALSE',
    validation_token    TEXT NOT NULL UNIQUE,
    token_expiry        TEXT NOT NULL,
    response_deadline   TEXT NOT NULL,
    days_remaining      INTEGER NOT NULL,
    assigned_to         TEXT,
    resolved_at         TEXT,
    download_url        TEXT,
    download_url_expiry TEXT,
    origin_ip           TEXT,
    user_agent          TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- Audit records are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS logs (
    log_id    TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    action    TEXT NOT NULL,
    reference TEXT NOT NULL,   -- request number
    detail    TEXT NOT NULL,
    actor     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS requests_email_idx  ON requests(email);
CREATE INDEX IF NOT EXISTS requests_status_idx ON requests(status);
CREATE INDEX IF NOT EXISTS logs_reference_idx  ON logs(reference);

PRAGMA user_version = 1;
";
