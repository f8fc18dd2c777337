//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with nanosecond precision. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are 0/1 integers.

use chrono::{DateTime, SecondsFormat, Utc};
use dossier_core::{
  classification::ClassificationAssignment,
  comment::DocumentComment,
  document::{BackendTag, Document, DocumentVersion, StoredContent},
  file_request::FileRequestDocument,
  grant::{GrantWindow, Grantee, PermissionGrant},
  link::ShareableLink,
  position::Position,
  status::DocumentStatus,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Fixed-width so that text ordering in SQL matches chronological ordering.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Stored content ──────────────────────────────────────────────────────────

/// The four storage columns shared by documents, versions and file requests.
pub struct RawContent {
  pub storage_path: String,
  pub backend:      String,
  pub size_bytes:   i64,
  pub content_hash: String,
}

impl RawContent {
  fn from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      storage_path: row.get(start)?,
      backend:      row.get(start + 1)?,
      size_bytes:   row.get(start + 2)?,
      content_hash: row.get(start + 3)?,
    })
  }

  fn into_content(self) -> Result<StoredContent> {
    Ok(StoredContent {
      storage_path: self.storage_path,
      backend:      BackendTag::parse(&self.backend)?,
      size_bytes:   u64::try_from(self.size_bytes).unwrap_or_default(),
      content_hash: self.content_hash,
    })
  }
}

/// `u64` sizes are stored in a signed INTEGER column.
pub fn encode_size(size: u64) -> i64 { i64::try_from(size).unwrap_or(i64::MAX) }

// ─── Documents ───────────────────────────────────────────────────────────────

pub const DOCUMENT_COLUMNS: &str = "document_id, name, storage_path, backend, \
  size_bytes, content_hash, category_id, client_id, status_id, created_by, \
  created_at, soft_deleted_at";

pub struct RawDocument {
  pub document_id:     String,
  pub name:            String,
  pub content:         RawContent,
  pub category_id:     Option<String>,
  pub client_id:       Option<String>,
  pub status_id:       Option<String>,
  pub created_by:      String,
  pub created_at:      String,
  pub soft_deleted_at: Option<String>,
}

impl RawDocument {
  /// Map a row selected with [`DOCUMENT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:     row.get(0)?,
      name:            row.get(1)?,
      content:         RawContent::from_row(row, 2)?,
      category_id:     row.get(6)?,
      client_id:       row.get(7)?,
      status_id:       row.get(8)?,
      created_by:      row.get(9)?,
      created_at:      row.get(10)?,
      soft_deleted_at: row.get(11)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id:     decode_uuid(&self.document_id)?,
      name:            self.name,
      content:         self.content.into_content()?,
      category_id:     decode_opt_uuid(self.category_id)?,
      client_id:       decode_opt_uuid(self.client_id)?,
      status_id:       decode_opt_uuid(self.status_id)?,
      created_by:      decode_uuid(&self.created_by)?,
      created_at:      decode_dt(&self.created_at)?,
      soft_deleted_at: decode_opt_dt(self.soft_deleted_at)?,
    })
  }
}

// ─── Versions ────────────────────────────────────────────────────────────────

pub const VERSION_COLUMNS: &str = "version_id, document_id, storage_path, \
  backend, size_bytes, content_hash, created_by, created_at, soft_deleted_at";

pub struct RawVersion {
  pub version_id:      String,
  pub document_id:     String,
  pub content:         RawContent,
  pub created_by:      String,
  pub created_at:      String,
  pub soft_deleted_at: Option<String>,
}

impl RawVersion {
  /// Map a row selected with [`VERSION_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      version_id:      row.get(0)?,
      document_id:     row.get(1)?,
      content:         RawContent::from_row(row, 2)?,
      created_by:      row.get(6)?,
      created_at:      row.get(7)?,
      soft_deleted_at: row.get(8)?,
    })
  }

  pub fn into_version(self) -> Result<DocumentVersion> {
    Ok(DocumentVersion {
      version_id:      decode_uuid(&self.version_id)?,
      document_id:     decode_uuid(&self.document_id)?,
      content:         self.content.into_content()?,
      created_by:      decode_uuid(&self.created_by)?,
      created_at:      decode_dt(&self.created_at)?,
      soft_deleted_at: decode_opt_dt(self.soft_deleted_at)?,
    })
  }
}

// ─── Grants ──────────────────────────────────────────────────────────────────

/// Columns of both permission tables; the grantee column is `user_id` or
/// `role_id` depending on the table.
pub fn grant_columns(grantee_column: &str) -> String {
  format!(
    "grant_id, document_id, {grantee_column}, is_time_bound, start_date, \
     end_date, allow_download, created_at"
  )
}

/// Which permission table a row came from.
#[derive(Clone, Copy)]
pub enum GrantTable {
  User,
  Role,
}

impl GrantTable {
  pub fn of(grantee: &Grantee) -> (Self, Uuid) {
    match *grantee {
      Grantee::User(id) => (Self::User, id),
      Grantee::Role(id) => (Self::Role, id),
    }
  }

  pub fn table(self) -> &'static str {
    match self {
      Self::User => "document_user_permissions",
      Self::Role => "document_role_permissions",
    }
  }

  pub fn grantee_column(self) -> &'static str {
    match self {
      Self::User => "user_id",
      Self::Role => "role_id",
    }
  }
}

pub struct RawGrant {
  pub table:          GrantTable,
  pub grant_id:       String,
  pub document_id:    String,
  pub grantee_id:     String,
  pub is_time_bound:  bool,
  pub start_date:     Option<String>,
  pub end_date:       Option<String>,
  pub allow_download: bool,
  pub created_at:     String,
}

impl RawGrant {
  /// Map a row selected with [`grant_columns`].
  pub fn from_row(table: GrantTable, row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      table,
      grant_id:       row.get(0)?,
      document_id:    row.get(1)?,
      grantee_id:     row.get(2)?,
      is_time_bound:  row.get(3)?,
      start_date:     row.get(4)?,
      end_date:       row.get(5)?,
      allow_download: row.get(6)?,
      created_at:     row.get(7)?,
    })
  }

  pub fn into_grant(self) -> Result<PermissionGrant> {
    let grantee_id = decode_uuid(&self.grantee_id)?;
    let grantee = match self.table {
      GrantTable::User => Grantee::User(grantee_id),
      GrantTable::Role => Grantee::Role(grantee_id),
    };
    Ok(PermissionGrant {
      grant_id: decode_uuid(&self.grant_id)?,
      document_id: decode_uuid(&self.document_id)?,
      grantee,
      window: GrantWindow {
        is_time_bound: self.is_time_bound,
        start_date:    decode_opt_dt(self.start_date)?,
        end_date:      decode_opt_dt(self.end_date)?,
      },
      allow_download: self.allow_download,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Share links ─────────────────────────────────────────────────────────────

pub const LINK_COLUMNS: &str = "code, document_id, password_hash, \
  allow_download, expires_at, is_active, created_by, created_at";

pub struct RawLink {
  pub code:           String,
  pub document_id:    String,
  pub password_hash:  Option<String>,
  pub allow_download: bool,
  pub expires_at:     Option<String>,
  pub is_active:      bool,
  pub created_by:     String,
  pub created_at:     String,
}

impl RawLink {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      code:           row.get(0)?,
      document_id:    row.get(1)?,
      password_hash:  row.get(2)?,
      allow_download: row.get(3)?,
      expires_at:     row.get(4)?,
      is_active:      row.get(5)?,
      created_by:     row.get(6)?,
      created_at:     row.get(7)?,
    })
  }

  pub fn into_link(self) -> Result<ShareableLink> {
    Ok(ShareableLink {
      code:           self.code,
      document_id:    decode_uuid(&self.document_id)?,
      password_hash:  self.password_hash,
      allow_download: self.allow_download,
      expires_at:     decode_opt_dt(self.expires_at)?,
      is_active:      self.is_active,
      created_by:     decode_uuid(&self.created_by)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

// ─── File requests ───────────────────────────────────────────────────────────

pub const FILE_REQUEST_COLUMNS: &str = "file_request_document_id, name, \
  storage_path, backend, size_bytes, content_hash, created_at";

pub struct RawFileRequest {
  pub id:         String,
  pub name:       String,
  pub content:    RawContent,
  pub created_at: String,
}

impl RawFileRequest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      content:    RawContent::from_row(row, 2)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_file_request(self) -> Result<FileRequestDocument> {
    Ok(FileRequestDocument {
      file_request_document_id: decode_uuid(&self.id)?,
      name:                     self.name,
      content:                  self.content.into_content()?,
      created_at:               decode_dt(&self.created_at)?,
    })
  }
}

// ─── Positions ───────────────────────────────────────────────────────────────

pub const POSITION_COLUMNS: &str = "position_id, name, parent_id, created_at";

pub struct RawPosition {
  pub position_id: String,
  pub name:        String,
  pub parent_id:   Option<String>,
  pub created_at:  String,
}

impl RawPosition {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      position_id: row.get(0)?,
      name:        row.get(1)?,
      parent_id:   row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_position(self) -> Result<Position> {
    Ok(Position {
      position_id: decode_uuid(&self.position_id)?,
      name:        self.name,
      parent_id:   decode_opt_uuid(self.parent_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub const COMMENT_COLUMNS: &str = "comment_id, document_id, author_id, body, \
  status_id, created_at";

pub struct RawComment {
  pub comment_id:  String,
  pub document_id: String,
  pub author_id:   String,
  pub body:        String,
  pub status_id:   Option<String>,
  pub created_at:  String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:  row.get(0)?,
      document_id: row.get(1)?,
      author_id:   row.get(2)?,
      body:        row.get(3)?,
      status_id:   row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<DocumentComment> {
    Ok(DocumentComment {
      comment_id:  decode_uuid(&self.comment_id)?,
      document_id: decode_uuid(&self.document_id)?,
      author_id:   decode_uuid(&self.author_id)?,
      body:        self.body,
      status_id:   decode_opt_uuid(self.status_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Statuses ────────────────────────────────────────────────────────────────

pub const STATUS_COLUMNS: &str = "status_id, name, color_code, created_at";

pub struct RawStatus {
  pub status_id:  String,
  pub name:       String,
  pub color_code: Option<String>,
  pub created_at: String,
}

impl RawStatus {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      status_id:  row.get(0)?,
      name:       row.get(1)?,
      color_code: row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_status(self) -> Result<DocumentStatus> {
    Ok(DocumentStatus {
      status_id:  decode_uuid(&self.status_id)?,
      name:       self.name,
      color_code: self.color_code,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

pub struct RawAssignment {
  pub document_id:  String,
  pub position_id:  Option<String>,
  pub source_label: Option<String>,
  pub created_at:   String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<ClassificationAssignment> {
    Ok(ClassificationAssignment {
      document_id:  decode_uuid(&self.document_id)?,
      position_id:  decode_opt_uuid(self.position_id)?,
      source_label: self.source_label,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_round_trip_through_rfc3339() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn unknown_backend_column_is_rejected() {
    let raw = RawContent {
      storage_path: "documents/a.pdf".into(),
      backend:      "floppy".into(),
      size_bytes:   1,
      content_hash: "00".into(),
    };
    assert!(matches!(
      raw.into_content(),
      Err(Error::Core(dossier_core::Error::UnknownBackend(_)))
    ));
  }
}
