//! Documents, their versions, and where their bytes live.
//!
//! A document's `storage_path` is fixed once written. New content for an
//! existing document becomes a [`DocumentVersion`]; the document row itself
//! is never re-pointed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Storage location ────────────────────────────────────────────────────────

/// Named storage backend a file was written to. Stored next to the path so
/// that reads always go back to the backend that holds the bytes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendTag {
  #[default]
  Local,
  S3,
}

impl BackendTag {
  /// Parse a stored or caller-supplied tag.
  pub fn parse(tag: &str) -> Result<Self> {
    tag
      .parse()
      .map_err(|_| Error::UnknownBackend(tag.to_owned()))
  }
}

/// The outcome of a confirmed write: everything a record needs to point at
/// the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
  pub storage_path: String,
  pub backend:      BackendTag,
  pub size_bytes:   u64,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash: String,
}

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub document_id:     Uuid,
  pub name:            String,
  pub content:         StoredContent,
  /// Organisational unit (position) the document is filed under. May be set
  /// asynchronously by the classification pipeline.
  pub category_id:     Option<Uuid>,
  pub client_id:       Option<Uuid>,
  pub status_id:       Option<Uuid>,
  pub created_by:      Uuid,
  pub created_at:      DateTime<Utc>,
  pub soft_deleted_at: Option<DateTime<Utc>>,
}

impl Document {
  pub fn is_archived(&self) -> bool { self.soft_deleted_at.is_some() }
}

/// Input to [`crate::store::DocumentStore::create_document`]. The content
/// must already be written and confirmed by the storage adapter.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub name:        String,
  pub content:     StoredContent,
  pub category_id: Option<Uuid>,
  pub client_id:   Option<Uuid>,
  pub status_id:   Option<Uuid>,
  pub created_by:  Uuid,
}

/// Metadata changes accepted by
/// [`crate::store::DocumentStore::update_document`]. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
  pub name:        Option<String>,
  pub category_id: Option<Uuid>,
  pub status_id:   Option<Uuid>,
}

/// Parameters for [`crate::store::DocumentStore::list_documents`].
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
  /// Case-insensitive substring match on the document name.
  pub text:             Option<String>,
  pub category_id:      Option<Uuid>,
  /// Archived (soft-deleted) documents are hidden unless this is set.
  pub include_archived: bool,
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// A re-upload of an existing document. Refers back to its document but does
/// not own it, and is independently retrievable and archivable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
  pub version_id:      Uuid,
  pub document_id:     Uuid,
  pub content:         StoredContent,
  pub created_by:      Uuid,
  pub created_at:      DateTime<Utc>,
  pub soft_deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewVersion {
  pub document_id: Uuid,
  pub content:     StoredContent,
  pub created_by:  Uuid,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backend_tags_use_lowercase_names() {
    assert_eq!(BackendTag::parse("local").unwrap(), BackendTag::Local);
    assert_eq!(BackendTag::parse("s3").unwrap(), BackendTag::S3);
    assert_eq!(BackendTag::S3.as_ref(), "s3");
    assert_eq!(BackendTag::Local.to_string(), "local");
  }

  #[test]
  fn unknown_backend_is_an_error() {
    assert!(matches!(
      BackendTag::parse("ftp"),
      Err(Error::UnknownBackend(t)) if t == "ftp"
    ));
  }
}
