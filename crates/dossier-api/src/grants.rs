//! Handlers for `/documents/{id}/grants`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents/{id}/grants` | Owner. Includes lapsed grants |
//! | `POST` | `/documents/{id}/grants` | Owner. Body: see [`GrantBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use dossier_core::{
  grant::{GrantWindow, Grantee, NewGrant, PermissionGrant},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::{ApiError, FieldError},
  guard::{load_document, require_owner},
  identity::Identity,
};

/// ```json
/// {
///   "grantee": {"kind": "role", "id": "…"},
///   "is_time_bound": true,
///   "start_date": "2026-01-01T00:00:00Z",
///   "end_date": "2026-02-01T00:00:00Z",
///   "allow_download": false
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct GrantBody {
  pub grantee:        Grantee,
  #[serde(flatten)]
  pub window:         GrantWindow,
  #[serde(default)]
  pub allow_download: bool,
}

fn validate_window(window: &GrantWindow) -> Result<(), ApiError> {
  if !window.is_time_bound {
    return Ok(());
  }
  let mut fields = Vec::new();
  if window.start_date.is_none() {
    fields.push(FieldError::new("start_date", "required for a time-bound grant"));
  }
  if window.end_date.is_none() {
    fields.push(FieldError::new("end_date", "required for a time-bound grant"));
  }
  if let (Some(start), Some(end)) = (window.start_date, window.end_date)
    && start > end
  {
    fields.push(FieldError::new("end_date", "must not be before start_date"));
  }
  if fields.is_empty() { Ok(()) } else { Err(ApiError::Validation(fields)) }
}

/// `GET /documents/{id}/grants`
pub async fn list<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PermissionGrant>>, ApiError> {
  let document = load_document(&*store, id).await?;
  require_owner(&document, &caller)?;
  let grants = store.list_grants(id).await.map_err(ApiError::store)?;
  Ok(Json(grants))
}

/// `POST /documents/{id}/grants`
pub async fn create<S: DocumentStore>(
  State(store): State<Arc<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<GrantBody>,
) -> Result<impl IntoResponse, ApiError> {
  let document = load_document(&*store, id).await?;
  require_owner(&document, &caller)?;
  validate_window(&body.window)?;

  let grant = store
    .add_grant(NewGrant {
      document_id:    id,
      grantee:        body.grantee,
      window:         body.window,
      allow_download: body.allow_download,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(document_id = %id, grant_id = %grant.grant_id, "grant created");
  Ok((StatusCode::CREATED, Json(grant)))
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;

  #[test]
  fn unbounded_windows_need_no_dates() {
    assert!(validate_window(&GrantWindow::unbounded()).is_ok());
  }

  #[test]
  fn time_bound_windows_need_ordered_dates() {
    let missing = GrantWindow { is_time_bound: true, ..Default::default() };
    let Err(ApiError::Validation(fields)) = validate_window(&missing) else {
      panic!("expected validation failure");
    };
    assert_eq!(fields.len(), 2);

    let now = Utc::now();
    let reversed = GrantWindow::between(now, now - Duration::days(1));
    assert!(matches!(validate_window(&reversed), Err(ApiError::Validation(_))));
  }
}
