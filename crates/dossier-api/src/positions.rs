//! Handlers for `/positions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/positions` | Whole roster, by name |
//! | `POST` | `/positions` | Admin. Body: `{"name":"Legal","parent_id":null}` |
//! | `GET`  | `/positions/roots` | Positions without a parent |
//! | `GET`  | `/positions/{id}` | 404 if not found |
//! | `GET`  | `/positions/{id}/children` | Direct children |
//! | `DELETE` | `/positions/{id}` | Admin. 409 while documents use it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use dossier_core::{
  position::{NewPosition, Position},
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{error::ApiError, guard::require_admin, identity::Identity};

/// `GET /positions`
pub async fn list<S: DocumentStore>(
  State(store): State<Arc<S>>,
  _caller: Identity,
) -> Result<Json<Vec<Position>>, ApiError> {
  let positions = store.list_positions().await.map_err(ApiError::store)?;
  Ok(Json(positions))
}

/// `GET /positions/roots`
pub async fn roots<S: DocumentStore>(
  State(store): State<Arc<S>>,
  _caller: Identity,
) -> Result<Json<Vec<Position>>, ApiError> {
  let positions = store.list_child_positions(None).await.map_err(ApiError::store)?;
  Ok(Json(positions))
}

/// `GET /positions/{id}/children`
pub async fn children<S: DocumentStore>(
  State(store): State<Arc<S>>,
  _caller: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Position>>, ApiError> {
  get_existing(&*store, id).await?;
  let positions = store.list_child_positions(Some(id)).await.map_err(ApiError::store)?;
  Ok(Json(positions))
}

/// `GET /positions/{id}`
pub async fn get_one<S: DocumentStore>(
  State(store): State<Arc<S>>,
  _caller: Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Position>, ApiError> {
  Ok(Json(get_existing(&*store, id).await?))
}

/// `POST /positions`
pub async fn create<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Json(body): Json<NewPosition>,
) -> Result<impl IntoResponse, ApiError> {
  require_admin(&caller)?;

  let name = body.name.trim().to_owned();
  if name.is_empty() {
    return Err(ApiError::invalid("name", "must not be empty"));
  }

  let position = store
    .create_position(NewPosition { name, parent_id: body.parent_id })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(position_id = %position.position_id, name = %position.name, "position created");
  Ok((StatusCode::CREATED, Json(position)))
}

/// `DELETE /positions/{id}`
pub async fn delete_one<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  require_admin(&caller)?;
  store.delete_position(id).await.map_err(ApiError::store)?;
  tracing::info!(position_id = %id, "position deleted");
  Ok(StatusCode::NO_CONTENT)
}

async fn get_existing<S: DocumentStore>(store: &S, id: Uuid) -> Result<Position, ApiError> {
  store
    .get_position(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("position {id} not found")))
}
