//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity provider: credentials only.
CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,         -- argon2 PHC string
    display_name  TEXT,
    created_at    TEXT NOT NULL
);

-- The used triple is written once and never reverted.
CREATE TABLE IF NOT EXISTS invitation_codes (
    id              TEXT PRIMARY KEY,
    code            TEXT NOT NULL,       -- 8 chars, uppercase alphanumeric
    role            TEXT NOT NULL,       -- 'admin' | 'manager'
    created_by      TEXT NOT NULL,
    created_by_name TEXT NOT NULL,
    is_used         INTEGER NOT NULL DEFAULT 0,
    used_by         TEXT,
    used_at         TEXT,
    expires_at      TEXT NOT NULL,
    created_at      TEXT,                -- NULL reads as now
    CHECK ((is_used = 0 AND used_by IS NULL     AND used_at IS NULL)
        OR (is_used = 1 AND used_by IS NOT NULL AND used_at IS NOT NULL))
);

CREATE TABLE IF NOT EXISTS users (
    uid        TEXT PRIMARY KEY,
    email      TEXT NOT NULL,
    name       TEXT NOT NULL,
    role       TEXT NOT NULL,            -- 'employee' | 'manager' | 'admin'
    department TEXT NOT NULL DEFAULT '',
    position   TEXT NOT NULL DEFAULT '',
    created_at TEXT,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS employees (
    id                TEXT PRIMARY KEY,
    employee_id       TEXT NOT NULL,
    name              TEXT NOT NULL DEFAULT '',
    first_name        TEXT,
    last_name         TEXT,
    email             TEXT NOT NULL,
    phone             TEXT NOT NULL DEFAULT '',
    department        TEXT NOT NULL DEFAULT '',
    position          TEXT NOT NULL DEFAULT '',
    role              TEXT NOT NULL DEFAULT 'employee',
    salary            REAL,
    hire_date         TEXT NOT NULL,     -- YYYY-MM-DD
    status            TEXT NOT NULL DEFAULT 'active',
    emergency_contact TEXT,              -- JSON or NULL
    uid               TEXT UNIQUE,       -- identity link
    is_registered     INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT,
    updated_at        TEXT
);

CREATE TABLE IF NOT EXISTS departments (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    head        TEXT,
    created_at  TEXT,
    updated_at  TEXT
);

-- Status leaves 'pending' at most once.
CREATE TABLE IF NOT EXISTS leave_requests (
    id             TEXT PRIMARY KEY,
    employee_uid   TEXT NOT NULL,
    employee_name  TEXT NOT NULL,
    department     TEXT NOT NULL DEFAULT '',
    leave_type     TEXT NOT NULL,
    start_date     TEXT NOT NULL,
    end_date       TEXT NOT NULL,
    days           INTEGER NOT NULL,
    reason         TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'pending',
    reviewed_by    TEXT,
    reviewer_name  TEXT,
    review_comment TEXT,
    reviewed_at    TEXT,
    created_at     TEXT,
    updated_at     TEXT,
    CHECK (end_date >= start_date)
);

CREATE INDEX IF NOT EXISTS invitation_codes_code_idx ON invitation_codes(code, is_used);
CREATE INDEX IF NOT EXISTS leave_requests_employee_idx ON leave_requests(employee_uid);

-- At most one unregistered employee per email.
CREATE UNIQUE INDEX IF NOT EXISTS employees_pending_email_idx
    ON employees(email COLLATE NOCASE) WHERE is_registered = 0;

PRAGMA user_version = 1;
";
