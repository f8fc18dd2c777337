//! SQL schema for the Dossier SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Organisational units. Also used as document categories.
CREATE TABLE IF NOT EXISTS positions (
    position_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    parent_id   TEXT REFERENCES positions(position_id),
    created_at  TEXT NOT NULL
);

-- Workflow vocabulary. Names are unique.
CREATE TABLE IF NOT EXISTS document_statuses (
    status_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    color_code TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    document_id     TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    storage_path    TEXT NOT NULL,   -- fixed once written
    backend         TEXT NOT NULL,   -- 'local' | 's3'
    size_bytes      INTEGER NOT NULL,
    content_hash    TEXT NOT NULL,   -- SHA-256 hex
    category_id     TEXT REFERENCES positions(position_id),
    client_id       TEXT,
    status_id       TEXT REFERENCES document_statuses(status_id),
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    soft_deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS document_versions (
    version_id      TEXT PRIMARY KEY,
    document_id     TEXT NOT NULL REFERENCES documents(document_id),
    storage_path    TEXT NOT NULL,
    backend         TEXT NOT NULL,
    size_bytes      INTEGER NOT NULL,
    content_hash    TEXT NOT NULL,
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    soft_deleted_at TEXT
);

-- Grants are never deleted when they lapse; they stay for audit.
CREATE TABLE IF NOT EXISTS document_user_permissions (
    grant_id       TEXT PRIMARY KEY,
    document_id    TEXT NOT NULL REFERENCES documents(document_id),
    user_id        TEXT NOT NULL,
    is_time_bound  INTEGER NOT NULL DEFAULT 0,
    start_date     TEXT,
    end_date       TEXT,
    allow_download INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS document_role_permissions (
    grant_id       TEXT PRIMARY KEY,
    document_id    TEXT NOT NULL REFERENCES documents(document_id),
    role_id        TEXT NOT NULL,
    is_time_bound  INTEGER NOT NULL DEFAULT 0,
    start_date     TEXT,
    end_date       TEXT,
    allow_download INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shareable_links (
    code           TEXT PRIMARY KEY,
    document_id    TEXT NOT NULL REFERENCES documents(document_id),
    password_hash  TEXT,             -- argon2 PHC string
    allow_download INTEGER NOT NULL DEFAULT 1,
    expires_at     TEXT,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_by     TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

-- No grants; the id is the only access control.
CREATE TABLE IF NOT EXISTS file_request_documents (
    file_request_document_id TEXT PRIMARY KEY,
    name                     TEXT NOT NULL,
    storage_path             TEXT NOT NULL,
    backend                  TEXT NOT NULL DEFAULT 'local',
    size_bytes               INTEGER NOT NULL,
    content_hash             TEXT NOT NULL,
    created_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS document_comments (
    comment_id  TEXT PRIMARY KEY,
    document_id TEXT NOT NULL REFERENCES documents(document_id),
    author_id   TEXT NOT NULL,
    body        TEXT NOT NULL,
    status_id   TEXT REFERENCES document_statuses(status_id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL
);

-- One row per document, replaced by each completed classification.
CREATE TABLE IF NOT EXISTS classification_assignments (
    document_id  TEXT PRIMARY KEY REFERENCES documents(document_id),
    position_id  TEXT REFERENCES positions(position_id) ON DELETE SET NULL,
    source_label TEXT,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS positions_parent_idx    ON positions(parent_id);
CREATE INDEX IF NOT EXISTS documents_category_idx  ON documents(category_id);
CREATE INDEX IF NOT EXISTS documents_status_idx    ON documents(status_id);
CREATE INDEX IF NOT EXISTS comments_document_idx   ON document_comments(document_id);
CREATE INDEX IF NOT EXISTS versions_document_idx   ON document_versions(document_id);
CREATE INDEX IF NOT EXISTS user_perms_document_idx ON document_user_permissions(document_id);
CREATE INDEX IF NOT EXISTS role_perms_document_idx ON document_role_permissions(document_id);

PRAGMA user_version = 1;
";
