//! The `DocumentStore` trait: persistence for every record the core reads.
//!
//! The trait is implemented by storage backends (e.g. `dossier-store-sqlite`).
//! Higher layers (`dossier-api`, `dossier-server`, `dossier-classify`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  DomainError,
  classification::ClassificationAssignment,
  comment::{DocumentComment, NewComment},
  document::{
    Document, DocumentPatch, DocumentQuery, DocumentVersion, NewDocument,
    NewVersion,
  },
  file_request::{FileRequestDocument, NewFileRequestDocument},
  grant::{NewGrant, PermissionGrant},
  link::{NewShareLink, ShareableLink},
  position::{NewPosition, Position},
  status::{DocumentStatus, NewStatus, StatusPatch},
};

/// Abstraction over a Dossier store backend.
///
/// Reads that take `include_archived` return soft-deleted rows only when it
/// is `true`. Direct-id retrieval passes `true` on purpose: archived content
/// stays reachable by anyone who already holds its id.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Positions ─────────────────────────────────────────────────────────

  /// Create a position. Fails if the parent does not exist or a sibling
  /// already carries the same name.
  fn create_position(
    &self,
    input: NewPosition,
  ) -> impl Future<Output = Result<Position, Self::Error>> + Send + '_;

  fn get_position(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Position>, Self::Error>> + Send + '_;

  /// The full roster, ordered by name.
  fn list_positions(
    &self,
  ) -> impl Future<Output = Result<Vec<Position>, Self::Error>> + Send + '_;

  /// Direct children of `parent`, or the roots when `parent` is `None`.
  fn list_child_positions(
    &self,
    parent: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Position>, Self::Error>> + Send + '_;

  /// Exact, case-sensitive name lookup. When several positions share a name
  /// the oldest wins.
  fn find_position_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Position>, Self::Error>> + Send + 'a;

  /// Delete a position. Refused while any document (archived or not) uses it
  /// as its category.
  fn delete_position(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  fn create_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  fn get_document(
    &self,
    id: Uuid,
    include_archived: bool,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  fn list_documents<'a>(
    &'a self,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Apply metadata changes. Storage fields are never touched. Fails if
  /// another live document in the target category has the target name, or
  /// if a new `status_id` names no existing status.
  fn update_document(
    &self,
    id: Uuid,
    patch: DocumentPatch,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Soft-delete. Bytes, versions and grants are left in place. Archiving an
  /// archived document keeps the original timestamp.
  fn archive_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  // ── Versions ──────────────────────────────────────────────────────────

  fn add_version(
    &self,
    input: NewVersion,
  ) -> impl Future<Output = Result<DocumentVersion, Self::Error>> + Send + '_;

  fn get_version(
    &self,
    id: Uuid,
    include_archived: bool,
  ) -> impl Future<Output = Result<Option<DocumentVersion>, Self::Error>> + Send + '_;

  /// Versions of a document, newest first.
  fn list_versions(
    &self,
    document_id: Uuid,
    include_archived: bool,
  ) -> impl Future<Output = Result<Vec<DocumentVersion>, Self::Error>> + Send + '_;

  fn archive_version(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<DocumentVersion, Self::Error>> + Send + '_;

  // ── Grants ────────────────────────────────────────────────────────────

  fn add_grant(
    &self,
    input: NewGrant,
  ) -> impl Future<Output = Result<PermissionGrant, Self::Error>> + Send + '_;

  /// Every grant on a document, user and role alike, including lapsed ones.
  fn list_grants(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PermissionGrant>, Self::Error>> + Send + '_;

  /// Grants on `document_id` issued to `user_id` or to any of `role_ids`.
  fn grants_for_caller<'a>(
    &'a self,
    document_id: Uuid,
    user_id: Uuid,
    role_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<PermissionGrant>, Self::Error>> + Send + 'a;

  // ── Share links ───────────────────────────────────────────────────────

  fn create_share_link(
    &self,
    input: NewShareLink,
  ) -> impl Future<Output = Result<ShareableLink, Self::Error>> + Send + '_;

  /// Look up a link by code regardless of its state.
  fn get_share_link<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<ShareableLink>, Self::Error>> + Send + 'a;

  /// Returns `false` if no link has this code.
  fn deactivate_share_link<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── File requests ─────────────────────────────────────────────────────

  fn add_file_request_document(
    &self,
    input: NewFileRequestDocument,
  ) -> impl Future<Output = Result<FileRequestDocument, Self::Error>> + Send + '_;

  fn get_file_request_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FileRequestDocument>, Self::Error>> + Send + '_;

  // ── Classification ────────────────────────────────────────────────────

  /// Atomically replace the document's assignment and, when it names a
  /// position, set that position as the document's category.
  fn record_classification(
    &self,
    assignment: ClassificationAssignment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_classification(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<ClassificationAssignment>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Fails if the document, or the attached status, does not exist.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<DocumentComment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentComment>, Self::Error>> + Send + '_;

  /// Comments on a document, newest first.
  fn list_comments(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DocumentComment>, Self::Error>> + Send + '_;

  fn delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Statuses ──────────────────────────────────────────────────────────

  /// Status names are unique.
  fn create_status(
    &self,
    input: NewStatus,
  ) -> impl Future<Output = Result<DocumentStatus, Self::Error>> + Send + '_;

  fn get_status(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentStatus>, Self::Error>> + Send + '_;

  /// Oldest first.
  fn list_statuses(
    &self,
  ) -> impl Future<Output = Result<Vec<DocumentStatus>, Self::Error>> + Send + '_;

  fn update_status(
    &self,
    id: Uuid,
    patch: StatusPatch,
  ) -> impl Future<Output = Result<DocumentStatus, Self::Error>> + Send + '_;

  /// Refused while any document uses the status. Comments that carry it
  /// lose the reference.
  fn delete_status(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
