//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every kind renders as `{"error": {"code": "...", "message": "..."}}` with
//! its own status, so that callers can tell failures apart without parsing
//! messages.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use dossier_core::{DomainError, resolve::ResolveError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self { field: field.into(), message: message.into() }
  }
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("link expired")]
  LinkExpired,

  #[error("password is incorrect")]
  PasswordIncorrect,

  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("access denied: {0}")]
  AccessDenied(String),

  #[error("storage backend unavailable: {0}")]
  BackendUnavailable(String),

  #[error("validation failed")]
  Validation(Vec<FieldError>),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure: domain not-found and conflict errors keep
  /// their meaning, everything else is internal.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match err.domain() {
      Some(d) if d.is_not_found() => Self::NotFound(d.to_string()),
      Some(d) if d.is_conflict() => Self::Conflict(d.to_string()),
      _ => Self::Internal(Box::new(err)),
    }
  }

  pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, message)])
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::LinkExpired => "link_expired",
      Self::PasswordIncorrect => "password_incorrect",
      Self::Unauthenticated(_) => "unauthenticated",
      Self::AccessDenied(_) => "access_denied",
      Self::BackendUnavailable(_) => "backend_unavailable",
      Self::Validation(_) => "validation_failed",
      Self::Conflict(_) => "conflict",
      Self::Internal(_) => "internal",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::LinkExpired => StatusCode::GONE,
      Self::PasswordIncorrect | Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      Self::AccessDenied(_) => StatusCode::FORBIDDEN,
      Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<ResolveError> for ApiError {
  fn from(err: ResolveError) -> Self {
    match err {
      ResolveError::NotFound => Self::NotFound("no document matches this identifier".into()),
      ResolveError::LinkExpired => Self::LinkExpired,
      ResolveError::PasswordIncorrect => Self::PasswordIncorrect,
      ResolveError::Store(e) => Self::Internal(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let code = self.code();

    if let Self::Internal(e) = &self {
      tracing::error!(error = %e, "internal error");
    }

    let body = match &self {
      Self::Validation(fields) => json!({
        "error": { "code": code, "message": self.to_string(), "fields": fields }
      }),
      _ => json!({ "error": { "code": code, "message": self.to_string() } }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn resolver_failures_stay_distinct() {
    let statuses: Vec<StatusCode> = [
      ResolveError::NotFound,
      ResolveError::LinkExpired,
      ResolveError::PasswordIncorrect,
    ]
    .into_iter()
    .map(|e| ApiError::from(e).status())
    .collect();
    assert_eq!(
      statuses,
      vec![StatusCode::NOT_FOUND, StatusCode::GONE, StatusCode::UNAUTHORIZED]
    );
  }

  #[test]
  fn domain_errors_are_classified() {
    let nf = ApiError::store(dossier_core::Error::DocumentNotFound(Uuid::nil()));
    assert_eq!(nf.code(), "not_found");

    let dup = ApiError::store(dossier_core::Error::DuplicatePosition("Legal".into()));
    assert_eq!(dup.code(), "conflict");

    let other = ApiError::store(dossier_core::Error::PasswordHash("boom".into()));
    assert_eq!(other.code(), "internal");
  }
}
