//! Handlers for share links.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents/{id}/links` | Owner. Body: `{"password":null,"allow_download":true,"expires_at":null}` |
//! | `POST` | `/links/{code}/deactivate` | Owner of the linked document |
//!
//! The password is hashed before it reaches the store and never returned.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use dossier_core::{
  link::{NewShareLink, hash_password},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  guard::{load_document, require_owner},
  identity::Identity,
};

fn default_true() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct CreateLinkBody {
  pub password:       Option<String>,
  #[serde(default = "default_true")]
  pub allow_download: bool,
  pub expires_at:     Option<DateTime<Utc>>,
}

/// `POST /documents/{id}/links`
pub async fn create<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateLinkBody>,
) -> Result<impl IntoResponse, ApiError> {
  let document = load_document(&*store, id).await?;
  require_owner(&document, &caller)?;

  if body.expires_at.is_some_and(|at| at <= Utc::now()) {
    return Err(ApiError::invalid("expires_at", "must be in the future"));
  }

  let password_hash = match body.password.as_deref().filter(|p| !p.is_empty()) {
    Some(password) => Some(hash_password(password).map_err(ApiError::store)?),
    None => None,
  };

  let link = store
    .create_share_link(NewShareLink {
      document_id: id,
      password_hash,
      allow_download: body.allow_download,
      expires_at: body.expires_at,
      created_by: caller.user_id,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(document_id = %id, protected = link.is_protected(), "share link created");
  Ok((StatusCode::CREATED, Json(link)))
}

/// `POST /links/{code}/deactivate`
pub async fn deactivate<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
  let link = store
    .get_share_link(&code)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("share link not found".into()))?;
  let document = load_document(&*store, link.document_id).await?;
  require_owner(&document, &caller)?;

  store.deactivate_share_link(&code).await.map_err(ApiError::store)?;
  tracing::info!(document_id = %link.document_id, "share link deactivated");
  Ok(StatusCode::NO_CONTENT)
}
