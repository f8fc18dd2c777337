//! Handlers for `/statuses`, the document workflow vocabulary.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/statuses` | Oldest first |
//! | `POST` | `/statuses` | Admin. Body: `{"name":"Draft","color_code":"#9e9e9e"}` |
//! | `GET`  | `/statuses/{id}` | 404 if not found |
//! | `PATCH` | `/statuses/{id}` | Admin. Body: any of `name`, `color_code` |
//! | `DELETE` | `/statuses/{id}` | Admin. 409 while documents use it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use dossier_core::{
  status::{DocumentStatus, NewStatus, StatusPatch},
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{error::ApiError, guard::require_admin, identity::Identity};

/// `GET /statuses`
pub async fn list<S: DocumentStore>(
  State(store): State<Arc<S>>,
  _caller: Identity,
) -> Result<Json<Vec<DocumentStatus>>, ApiError> {
  let statuses = store.list_statuses().await.map_err(ApiError::store)?;
  Ok(Json(statuses))
}

/// `GET /statuses/{id}`
pub async fn get_one<S: DocumentStore>(
  State(store): State<Arc<S>>,
  _caller: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentStatus>, ApiError> {
  let status = store
    .get_status(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("status {id} not found")))?;
  Ok(Json(status))
}

/// `POST /statuses`
pub async fn create<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Json(body): Json<NewStatus>,
) -> Result<impl IntoResponse, ApiError> {
  require_admin(&caller)?;
  let name = required_name(&body.name)?;

  let status = store
    .create_status(NewStatus { name, color_code: body.color_code })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(status_id = %status.status_id, name = %status.name, "status created");
  Ok((StatusCode::CREATED, Json(status)))
}

/// `PATCH /statuses/{id}`
pub async fn update<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Json(mut patch): Json<StatusPatch>,
) -> Result<Json<DocumentStatus>, ApiError> {
  require_admin(&caller)?;
  if let Some(name) = &patch.name {
    patch.name = Some(required_name(name)?);
  }

  let status = store.update_status(id, patch).await.map_err(ApiError::store)?;
  tracing::info!(status_id = %id, name = %status.name, "status updated");
  Ok(Json(status))
}

/// `DELETE /statuses/{id}`
pub async fn delete_one<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  require_admin(&caller)?;
  store.delete_status(id).await.map_err(ApiError::store)?;
  tracing::info!(status_id = %id, "status deleted");
  Ok(StatusCode::NO_CONTENT)
}

fn required_name(name: &str) -> Result<String, ApiError> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    Err(ApiError::invalid("name", "must not be empty"))
  } else {
    Ok(trimmed.to_owned())
  }
}
