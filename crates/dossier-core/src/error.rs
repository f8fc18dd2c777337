//! Error types for `dossier-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("document version not found: {0}")]
  VersionNotFound(Uuid),

  #[error("position not found: {0}")]
  PositionNotFound(Uuid),

  #[error("position {0} is still assigned to at least one document")]
  PositionInUse(Uuid),

  #[error("position {0} still has child positions")]
  PositionHasChildren(Uuid),

  #[error("a position named {0:?} already exists under the same parent")]
  DuplicatePosition(String),

  #[error("a document named {0:?} already exists in the same category")]
  DuplicateDocument(String),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("document status not found: {0}")]
  StatusNotFound(Uuid),

  #[error("a document status named {0:?} already exists")]
  DuplicateStatus(String),

  #[error("document status {0} is still assigned to at least one document")]
  StatusInUse(Uuid),

  #[error("unknown storage backend: {0:?}")]
  UnknownBackend(String),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

impl Error {
  /// Whether the failure means a referenced record does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::DocumentNotFound(_)
        | Self::VersionNotFound(_)
        | Self::PositionNotFound(_)
        | Self::CommentNotFound(_)
        | Self::StatusNotFound(_)
    )
  }

  /// Whether the failure is a conflict with existing data.
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::PositionInUse(_)
        | Self::PositionHasChildren(_)
        | Self::DuplicatePosition(_)
        | Self::DuplicateDocument(_)
        | Self::DuplicateStatus(_)
        | Self::StatusInUse(_)
    )
  }
}

/// Implemented by store error types so that callers generic over a store can
/// tell domain failures apart from infrastructure ones.
pub trait DomainError {
  /// The domain-level failure behind this error, if it is one.
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
