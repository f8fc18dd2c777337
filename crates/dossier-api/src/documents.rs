//! Handlers for document metadata, versions and classification read-back.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents` | `?q=&category_id=&include_archived=&limit=&offset=` |
//! | `GET`  | `/documents/{id}` | Needs view access |
//! | `PATCH` | `/documents/{id}` | Owner. Body: any of `name`, `category_id`, `status_id` |
//! | `POST` | `/documents/{id}/archive` | Owner |
//! | `GET`  | `/documents/{id}/versions` | Needs view access; `?include_archived=` |
//! | `POST` | `/versions/{id}/archive` | Owner of the parent document |
//! | `GET`  | `/documents/{id}/classification` | Needs view access |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use dossier_core::{
  classification::ClassificationAssignment,
  document::{Document, DocumentPatch, DocumentQuery, DocumentVersion},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  guard::{decide, load_document, require_owner, require_view},
  identity::Identity,
};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Name substring.
  pub q:                Option<String>,
  pub category_id:      Option<Uuid>,
  #[serde(default)]
  pub include_archived: bool,
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
}

/// `GET /documents`
///
/// Administrators see every matching document. Everyone else sees the ones
/// they currently have view access to.
pub async fn list<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Document>>, ApiError> {
  let query = DocumentQuery {
    text:             params.q,
    category_id:      params.category_id,
    include_archived: params.include_archived,
    limit:            Some(params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)),
    offset:           params.offset,
  };
  let documents = store.list_documents(&query).await.map_err(ApiError::store)?;
  if caller.is_admin {
    return Ok(Json(documents));
  }

  let mut visible = Vec::with_capacity(documents.len());
  for document in documents {
    if decide(&*store, &document, &caller).await?.can_view {
      visible.push(document);
    }
  }
  Ok(Json(visible))
}

// ─── Get / update / archive ──────────────────────────────────────────────────

/// `GET /documents/{id}`
pub async fn get_one<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_view(&*store, &document, &caller).await?;
  Ok(Json(document))
}

/// `PATCH /documents/{id}`
pub async fn update<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Json(mut patch): Json<DocumentPatch>,
) -> Result<Json<Document>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_owner(&document, &caller)?;

  if let Some(name) = &patch.name {
    let trimmed = name.trim();
    if trimmed.is_empty() {
      return Err(ApiError::invalid("name", "must not be empty"));
    }
    patch.name = Some(trimmed.to_owned());
  }

  let updated = store.update_document(id, patch).await.map_err(ApiError::store)?;
  tracing::info!(document_id = %id, "document updated");
  Ok(Json(updated))
}

/// `POST /documents/{id}/archive`
pub async fn archive<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_owner(&document, &caller)?;
  let archived = store.archive_document(id).await.map_err(ApiError::store)?;
  tracing::info!(document_id = %id, "document archived");
  Ok(Json(archived))
}

// ─── Versions ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct VersionParams {
  #[serde(default)]
  pub include_archived: bool,
}

/// `GET /documents/{id}/versions`
pub async fn versions<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Query(params): Query<VersionParams>,
) -> Result<Json<Vec<DocumentVersion>>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_view(&*store, &document, &caller).await?;
  let versions = store
    .list_versions(id, params.include_archived)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(versions))
}

/// `POST /versions/{id}/archive`
pub async fn archive_version<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentVersion>, ApiError> {
  let version = store
    .get_version(id, true)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("version {id} not found")))?;
  let document = load_document(&*store, version.document_id).await?;
  require_owner(&document, &caller)?;

  let archived = store.archive_version(id).await.map_err(ApiError::store)?;
  tracing::info!(version_id = %id, document_id = %document.document_id, "version archived");
  Ok(Json(archived))
}

// ─── Classification ──────────────────────────────────────────────────────────

/// `GET /documents/{id}/classification`
pub async fn classification<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<ClassificationAssignment>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_view(&*store, &document, &caller).await?;
  let assignment = store
    .get_classification(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} has not been classified")))?;
  Ok(Json(assignment))
}
