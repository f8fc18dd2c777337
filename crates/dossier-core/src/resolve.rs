//! The identifier resolver.
//!
//! Four independent entry identifiers lead to stored bytes: a document id, a
//! version id, a share code (with an optional password) and a file-request id.
//! Each path is terminal. A failure on one path is reported as-is and never
//! retried through another.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  access::{self, AccessBasis, AccessDecision, Caller, Principal},
  document::{BackendTag, Document, DocumentVersion, StoredContent},
  file_request::FileRequestDocument,
  link::ShareableLink,
  store::DocumentStore,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why an identifier did not resolve. Each kind maps to its own
/// caller-visible response.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("not found")]
  NotFound,

  /// The share code is unknown, deactivated or past its expiry.
  #[error("link expired")]
  LinkExpired,

  #[error("password is incorrect")]
  PasswordIncorrect,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> ResolveError {
  ResolveError::Store(Box::new(e))
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// An external identifier as presented by a caller.
#[derive(Debug, Clone)]
pub enum Locator {
  Document(Uuid),
  Version(Uuid),
  ShareCode {
    code:     String,
    password: Option<String>,
  },
  FileRequest(Uuid),
}

impl Locator {
  /// A direct id, interpreted as a version id when `is_version` is set.
  pub fn direct(id: Uuid, is_version: bool) -> Self {
    if is_version { Self::Version(id) } else { Self::Document(id) }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// The record a locator landed on.
#[derive(Debug, Clone)]
pub enum TargetRecord {
  Document(Document),
  Version(DocumentVersion),
  FileRequest(FileRequestDocument),
}

/// A canonical storage location plus the records needed to authorise it.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
  pub record:       TargetRecord,
  /// The owning document: the record itself, a version's parent, or `None`
  /// for file-request documents and orphaned versions.
  pub document:     Option<Document>,
  /// Set when the target was reached through a validated share link.
  pub link:         Option<ShareableLink>,
  /// Logical name, without extension.
  pub display_name: String,
}

impl ResolvedTarget {
  pub fn content(&self) -> &StoredContent {
    match &self.record {
      TargetRecord::Document(d) => &d.content,
      TargetRecord::Version(v) => &v.content,
      TargetRecord::FileRequest(f) => &f.content,
    }
  }

  pub fn storage_path(&self) -> &str { &self.content().storage_path }

  /// File-request documents always live on the local backend.
  pub fn backend(&self) -> BackendTag {
    match &self.record {
      TargetRecord::FileRequest(_) => BackendTag::Local,
      _ => self.content().backend,
    }
  }

  pub fn is_version(&self) -> bool {
    matches!(self.record, TargetRecord::Version(_))
  }

  pub fn document_id(&self) -> Option<Uuid> {
    match &self.record {
      TargetRecord::Document(d) => Some(d.document_id),
      TargetRecord::Version(v) => Some(v.document_id),
      TargetRecord::FileRequest(_) => None,
    }
  }

  /// The filename offered to clients: the logical name plus the extension of
  /// the stored file, never the physical path.
  pub fn display_filename(&self) -> String {
    display_filename(&self.display_name, self.storage_path())
  }
}

/// Join a logical name with the extension of `storage_path`, if it has one.
pub fn display_filename(name: &str, storage_path: &str) -> String {
  match Path::new(storage_path).extension().and_then(|e| e.to_str()) {
    Some(ext) if !ext.is_empty() => format!("{name}.{ext}"),
    _ => name.to_owned(),
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve `locator` to a storage location.
///
/// Direct document and version lookups include archived rows.
pub async fn resolve<S: DocumentStore>(
  store: &S,
  locator: Locator,
  now: DateTime<Utc>,
) -> Result<ResolvedTarget, ResolveError> {
  match locator {
    Locator::Document(id) => resolve_document(store, id, None).await,
    Locator::Version(id) => resolve_version(store, id).await,
    Locator::ShareCode { code, password } => {
      let link = store
        .get_share_link(&code)
        .await
        .map_err(store_err)?
        .filter(|l| l.is_live_at(now))
        .ok_or(ResolveError::LinkExpired)?;

      if !link.accepts_password(password.as_deref()) {
        return Err(ResolveError::PasswordIncorrect);
      }
      let document_id = link.document_id;
      resolve_document(store, document_id, Some(link)).await
    }
    Locator::FileRequest(id) => {
      let file = store
        .get_file_request_document(id)
        .await
        .map_err(store_err)?
        .ok_or(ResolveError::NotFound)?;
      Ok(ResolvedTarget {
        display_name: file.name.clone(),
        record:       TargetRecord::FileRequest(file),
        document:     None,
        link:         None,
      })
    }
  }
}

async fn resolve_document<S: DocumentStore>(
  store: &S,
  id: Uuid,
  link: Option<ShareableLink>,
) -> Result<ResolvedTarget, ResolveError> {
  let document = store
    .get_document(id, true)
    .await
    .map_err(store_err)?
    .ok_or(ResolveError::NotFound)?;
  Ok(ResolvedTarget {
    display_name: document.name.clone(),
    record: TargetRecord::Document(document.clone()),
    document: Some(document),
    link,
  })
}

async fn resolve_version<S: DocumentStore>(
  store: &S,
  id: Uuid,
) -> Result<ResolvedTarget, ResolveError> {
  let version = store
    .get_version(id, true)
    .await
    .map_err(store_err)?
    .ok_or(ResolveError::NotFound)?;
  let document = store
    .get_document(version.document_id, true)
    .await
    .map_err(store_err)?;
  let display_name = document
    .as_ref()
    .map(|d| d.name.clone())
    .unwrap_or_else(|| version.version_id.to_string());
  Ok(ResolvedTarget {
    record: TargetRecord::Version(version),
    document,
    link: None,
    display_name,
  })
}

// ─── Authorisation ───────────────────────────────────────────────────────────

/// Result of [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
  Decided(AccessDecision),
  /// The target is only reachable by an identified caller and none was given.
  IdentityRequired,
}

/// Decide what the caller may do with a resolved target.
///
/// - Share-link targets are governed by the link alone.
/// - File-request documents are open to anyone holding the id.
/// - Everything else goes through the grant evaluator against the owning
///   document.
pub async fn authorize<S: DocumentStore>(
  store: &S,
  target: &ResolvedTarget,
  caller: Option<&Caller>,
  now: DateTime<Utc>,
) -> Result<Authorization, ResolveError> {
  if let Some(link) = &target.link {
    let document = target.document.as_ref().ok_or(ResolveError::NotFound)?;
    let principal = Principal::AnonymousLink { allow_download: link.allow_download };
    return Ok(Authorization::Decided(access::evaluate(document, &principal, &[], now)));
  }

  if let TargetRecord::FileRequest(_) = target.record {
    return Ok(Authorization::Decided(AccessDecision {
      can_view:     true,
      can_download: true,
      due_date:     None,
      basis:        AccessBasis::Link,
    }));
  }

  let Some(caller) = caller else {
    return Ok(Authorization::IdentityRequired);
  };
  let document = target.document.as_ref().ok_or(ResolveError::NotFound)?;

  let grants = store
    .grants_for_caller(document.document_id, caller.user_id, &caller.role_ids)
    .await
    .map_err(store_err)?;

  let principal = Principal::Caller(caller.clone());
  Ok(Authorization::Decided(access::evaluate(document, &principal, &grants, now)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_filename_takes_the_stored_extension() {
    assert_eq!(display_filename("Budget memo", "documents/9f2c.pdf"), "Budget memo.pdf");
    assert_eq!(display_filename("Scan", "documents/abc.tar.gz"), "Scan.gz");
  }

  #[test]
  fn display_filename_without_extension_is_the_name() {
    assert_eq!(display_filename("Notes", "documents/abc"), "Notes");
  }

  #[test]
  fn direct_locator_respects_version_flag() {
    let id = Uuid::new_v4();
    assert!(matches!(Locator::direct(id, true), Locator::Version(v) if v == id));
    assert!(matches!(Locator::direct(id, false), Locator::Document(d) if d == id));
  }
}
