//! Mapping of storage and multipart failures onto [`ApiError`].
//!
//! Handlers here answer with the same JSON error body as the `/api` routes.

use axum::{extract::multipart::MultipartError, http::StatusCode};
use dossier_api::ApiError;
use dossier_storage::StorageError;

/// A stored file that cannot be read is reported as missing; a backend that
/// refuses a write is `backend_unavailable`.
pub fn storage(err: StorageError) -> ApiError {
  match err {
    StorageError::NotFound { path } => ApiError::NotFound(format!("stored file missing: {path}")),
    StorageError::BackendUnavailable { .. } => ApiError::BackendUnavailable(err.to_string()),
    StorageError::Operation(_) => ApiError::Internal(Box::new(err)),
  }
}

/// Malformed or oversized multipart bodies are validation failures against
/// the `file` field.
pub fn multipart(err: MultipartError, limit: usize) -> ApiError {
  if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::invalid("file", format!("exceeds the upload limit of {limit} bytes"))
  } else {
    ApiError::invalid("file", err.body_text())
  }
}

#[cfg(test)]
mod tests {
  use dossier_core::document::BackendTag;

  use super::*;

  #[test]
  fn storage_failures_keep_their_kind() {
    let missing = storage(StorageError::NotFound { path: "documents/a.pdf".into() });
    assert_eq!(missing.code(), "not_found");

    let down = storage(StorageError::unavailable(BackendTag::S3, "bucket is not set"));
    assert_eq!(down.code(), "backend_unavailable");
    assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);

    let other = storage(StorageError::Operation("io".into()));
    assert_eq!(other.code(), "internal");
  }
}
