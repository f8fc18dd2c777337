//! Handlers for document comments.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents/{id}/comments` | Needs view access. Newest first |
//! | `POST` | `/documents/{id}/comments` | Needs view access. Body: `{"body":"...","status_id":null}` |
//! | `DELETE` | `/comments/{id}` | Author, document owner or admin |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use dossier_core::{
  comment::{DocumentComment, NewComment},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  guard::{load_document, require_view},
  identity::Identity,
};

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body:      String,
  pub status_id: Option<Uuid>,
}

/// `GET /documents/{id}/comments`
pub async fn list<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DocumentComment>>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_view(&*store, &document, &caller).await?;
  let comments = store.list_comments(id).await.map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /documents/{id}/comments`
pub async fn create<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let document = load_document(&*store, id).await?;
  require_view(&*store, &document, &caller).await?;

  let text = body.body.trim();
  if text.is_empty() {
    return Err(ApiError::invalid("body", "must not be empty"));
  }

  let comment = store
    .add_comment(NewComment {
      document_id: id,
      author_id:   caller.user_id,
      body:        text.to_owned(),
      status_id:   body.status_id,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(comment_id = %comment.comment_id, document_id = %id, "comment added");
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/{id}`
pub async fn delete_one<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let comment = store
    .get_comment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("comment {id} not found")))?;
  let document = load_document(&*store, comment.document_id).await?;
  if !comment.removable_by(&caller, document.created_by) {
    return Err(ApiError::AccessDenied(format!("may not delete comment {id}")));
  }

  store.delete_comment(id).await.map_err(ApiError::store)?;
  tracing::info!(comment_id = %id, document_id = %document.document_id, "comment deleted");
  Ok(StatusCode::NO_CONTENT)
}
