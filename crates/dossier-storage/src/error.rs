//! Error type for `dossier-storage`.

use dossier_core::document::BackendTag;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("stored file not found: {path}")]
  NotFound { path: String },

  /// The backend is unknown, misconfigured or failed to accept a write.
  #[error("storage backend {backend} is unavailable: {reason}")]
  BackendUnavailable { backend: BackendTag, reason: String },

  #[error("storage operation failed: {0}")]
  Operation(String),
}

impl StorageError {
  pub fn unavailable(backend: BackendTag, reason: impl Into<String>) -> Self {
    Self::BackendUnavailable { backend, reason: reason.into() }
  }
}

impl From<opendal::Error> for StorageError {
  fn from(err: opendal::Error) -> Self {
    match err.kind() {
      opendal::ErrorKind::NotFound => Self::NotFound { path: err.to_string() },
      _ => Self::Operation(err.to_string()),
    }
  }
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;
